use definition_core::DefinitionPackage;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Computes the SHA-256 hex digest of a package's definitions.
///
/// The digest covers the compact JSON encoding of the definition list only,
/// so package metadata such as `generated_at` does not affect it. Field order
/// follows the struct layout, which keeps the encoding deterministic.
///
/// # Examples
///
/// ```
/// use definition_core::{Definition, DefinitionPackage};
/// use definition_store::compute_bundle_hash;
///
/// let mut a = DefinitionPackage::new("1.0.0", "2024-01-01T00:00:00Z");
/// a.definitions.push(Definition::new("case"));
/// let mut b = DefinitionPackage::new("1.0.0", "2025-06-30T12:00:00Z");
/// b.definitions.push(Definition::new("case"));
///
/// let hash = compute_bundle_hash(&a).unwrap();
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, compute_bundle_hash(&b).unwrap());
/// ```
pub fn compute_bundle_hash(package: &DefinitionPackage) -> Result<String> {
    let bytes = serde_json::to_vec(&package.definitions)?;
    let hash = Sha256::digest(&bytes);
    Ok(format!("{:x}", hash))
}

#[cfg(test)]
mod tests {
    use definition_core::{Definition, Field};

    use super::*;

    #[test]
    fn test_hash_changes_with_content() {
        let mut package = DefinitionPackage::new("1.0.0", "2024-01-01T00:00:00Z");
        package.definitions.push(Definition::new("case"));
        let before = compute_bundle_hash(&package).unwrap();

        package.definitions[0].fields.push(Field::new("title"));
        let after = compute_bundle_hash(&package).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_empty_package_hash() {
        let package = DefinitionPackage::new("1.0.0", "2024-01-01T00:00:00Z");
        // sha256("[]")
        assert_eq!(
            compute_bundle_hash(&package).unwrap(),
            "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945"
        );
    }
}

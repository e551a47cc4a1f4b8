//! Hashing utilities
//!
//! Discriminators are the first 8 bytes of `sha256(preimage)`. The preimage
//! convention is part of the wire contract with the on-chain program:
//!
//! * instructions: `global:<snake_case name>`
//! * accounts: `account:<name>` with only the first character uppercased,
//!   so acronyms such as `NFTInfo` hash as written

use crate::constants::discriminator::{ACCOUNT_NAMESPACE, DISCRIMINATOR_SIZE, GLOBAL_NAMESPACE};
use crate::utils::naming::{to_field_name, upper_first};
use sha2::{Digest, Sha256};

/// 8-byte schema tag prefixed to account data and instruction payloads.
pub type Discriminator = [u8; DISCRIMINATOR_SIZE];

/// Which namespace a discriminator is derived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscriminatorKind {
    /// Instruction discriminators.
    Global,
    /// Account discriminators.
    Account,
}

impl DiscriminatorKind {
    /// The preimage hashed for `name` in this namespace.
    pub fn preimage(self, name: &str) -> String {
        match self {
            DiscriminatorKind::Global => format!("{}:{}", GLOBAL_NAMESPACE, to_field_name(name)),
            DiscriminatorKind::Account => format!("{}:{}", ACCOUNT_NAMESPACE, upper_first(name)),
        }
    }
}

/// Generate an Anchor discriminator from a name
pub fn discriminator(name: &str, kind: DiscriminatorKind) -> Discriminator {
    hash_preimage(&kind.preimage(name))
}

/// Instruction discriminator (`global:` namespace)
pub fn sighash(instruction_name: &str) -> Discriminator {
    discriminator(instruction_name, DiscriminatorKind::Global)
}

/// Account discriminator (`account:` namespace)
pub fn account_discriminator(account_name: &str) -> Discriminator {
    discriminator(account_name, DiscriminatorKind::Account)
}

fn hash_preimage(preimage: &str) -> Discriminator {
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    let hash = hasher.finalize();

    let mut result = [0u8; DISCRIMINATOR_SIZE];
    result.copy_from_slice(&hash[..DISCRIMINATOR_SIZE]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_counter_account_conformance_vector() {
        assert_eq!(
            discriminator("counter", DiscriminatorKind::Account),
            [0xff, 0xb0, 0x04, 0xf5, 0xbc, 0xfd, 0x7c, 0x19]
        );
        // Only the first character is uppercased before hashing.
        assert_eq!(account_discriminator("Counter"), account_discriminator("counter"));
    }

    #[test]
    fn test_instruction_vectors() {
        assert_eq!(sighash("initialize"), [0xaf, 0xaf, 0x6d, 0x1f, 0x0d, 0x98, 0x9b, 0xed]);
        assert_eq!(sighash("increment"), [0x0b, 0x12, 0x68, 0x09, 0x68, 0xae, 0x3b, 0x21]);
        // camelCase IDL names hash the same as their snake_case form.
        assert_eq!(sighash("swapTokens"), [0xc9, 0xe2, 0xea, 0x10, 0x46, 0x9b, 0x83, 0xce]);
        assert_eq!(sighash("swapTokens"), sighash("swap_tokens"));
    }

    #[test]
    fn test_namespaces_differ() {
        assert_ne!(sighash("counter"), account_discriminator("counter"));
        assert_eq!(DiscriminatorKind::Global.preimage("doThing"), "global:do_thing");
        assert_eq!(DiscriminatorKind::Account.preimage("gameState"), "account:GameState");
    }

    #[test]
    fn test_acronym_account_names_hash_as_written() {
        assert_eq!(DiscriminatorKind::Account.preimage("NFTInfo"), "account:NFTInfo");
        assert_eq!(
            account_discriminator("NFTInfo"),
            [0x45, 0xec, 0x24, 0x14, 0x35, 0xc2, 0x8e, 0x34]
        );
        assert_eq!(account_discriminator("NFTInfo"), hash_preimage("account:NFTInfo"));
        assert_ne!(account_discriminator("NFTInfo"), account_discriminator("NftInfo"));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(sighash("transfer"), sighash("transfer"));
        assert_eq!(account_discriminator("Vault"), account_discriminator("Vault"));
    }

    #[test]
    fn test_no_collisions_in_corpus() {
        let mut seen = HashSet::new();
        for i in 0..2000 {
            for kind in [DiscriminatorKind::Global, DiscriminatorKind::Account] {
                let preimage = kind.preimage(&format!("name_{}", i));
                assert!(seen.insert(hash_preimage(&preimage)), "collision for {}", preimage);
            }
        }
        assert_eq!(seen.len(), 4000);
    }
}

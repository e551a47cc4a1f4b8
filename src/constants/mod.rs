//! Constants used throughout the generator

pub mod anchor;

/// Discriminator constants
pub mod discriminator {
    /// Length of every account and instruction discriminator.
    pub const DISCRIMINATOR_SIZE: usize = 8;

    /// Preimage namespace for instruction discriminators (`global:<snake_case>`).
    pub const GLOBAL_NAMESPACE: &str = "global";

    /// Preimage namespace for account discriminators (`account:<UpperCamelCase>`).
    pub const ACCOUNT_NAMESPACE: &str = "account";
}

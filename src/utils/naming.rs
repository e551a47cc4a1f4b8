//! Identifier case conversion for generated names

use heck::{ToSnakeCase, ToUpperCamelCase};

/// Name of a generated type (`game_state` -> `GameState`)
pub fn to_type_name(name: &str) -> String {
    name.to_upper_camel_case()
}

/// Uppercase the first character and keep the rest as written (`NFTInfo` stays `NFTInfo`)
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of a generated field or function (`vaultA` -> `vault_a`)
pub fn to_field_name(name: &str) -> String {
    name.to_snake_case()
}

/// `<Ix>Args` record name for an instruction
pub fn args_record_name(instruction: &str) -> String {
    format!("{}Args", to_type_name(instruction))
}

/// `<Ix>Accounts` record name for an instruction
pub fn accounts_record_name(instruction: &str) -> String {
    format!("{}Accounts", to_type_name(instruction))
}

/// `<Group>Nested` record name for a nested account group
pub fn nested_accounts_record_name(group: &str) -> String {
    format!("{}Nested", to_type_name(group))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(to_type_name("counter"), "Counter");
        assert_eq!(to_field_name("poolAuthority"), "pool_authority");
        assert_eq!(args_record_name("swapTokens"), "SwapTokensArgs");
        assert_eq!(accounts_record_name("initialize"), "InitializeAccounts");
        assert_eq!(nested_accounts_record_name("pool"), "PoolNested");
    }

    #[test]
    fn test_upper_first_keeps_acronyms() {
        assert_eq!(upper_first("counter"), "Counter");
        assert_eq!(upper_first("NFTInfo"), "NFTInfo");
        assert_eq!(upper_first("gameState"), "GameState");
        assert_eq!(upper_first(""), "");
        // The generated type name still goes through heck
        assert_eq!(to_type_name("NFTInfo"), "NftInfo");
    }
}

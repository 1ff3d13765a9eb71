//! Verification scripts and the accounts derived from them.

use crate::interop::interop_hash;
use crate::{Error, Result};
use neo_core::{PublicKey, UInt160};
use neo_vm::ScriptBuilder;

/// Price of one signature check, in execution units.
pub const CHECK_SIG_PRICE: i64 = 1 << 15;

/// Maximum number of keys in a multi-signature script.
pub const MAX_MULTISIG_KEYS: usize = 1024;

/// `PUSHDATA key; SYSCALL System.Crypto.CheckSig`.
pub fn signature_redeem_script(key: &PublicKey) -> Vec<u8> {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push(key.as_bytes())
        .emit_syscall(interop_hash("System.Crypto.CheckSig"));
    builder.to_array()
}

/// `PUSH m; PUSHDATA key...; PUSH n; SYSCALL System.Crypto.CheckMultisig`
/// with the keys in ascending order.
pub fn multisig_redeem_script(m: usize, keys: &[PublicKey]) -> Result<Vec<u8>> {
    if m == 0 || m > keys.len() || keys.len() > MAX_MULTISIG_KEYS {
        return Err(Error::invalid_argument(format!(
            "invalid multi-signature threshold {m} of {}",
            keys.len()
        )));
    }
    let mut sorted = keys.to_vec();
    sorted.sort();
    let mut builder = ScriptBuilder::new();
    builder.emit_push_int(m as i64);
    for key in &sorted {
        builder.emit_push(key.as_bytes());
    }
    builder
        .emit_push_int(sorted.len() as i64)
        .emit_syscall(interop_hash("System.Crypto.CheckMultisig"));
    Ok(builder.to_array())
}

/// Script hash of a single-key account.
pub fn standard_account(key: &PublicKey) -> UInt160 {
    UInt160::from_script(&signature_redeem_script(key))
}

/// Script hash of an `m`-of-`n` account.
pub fn multisig_account(m: usize, keys: &[PublicKey]) -> Result<UInt160> {
    Ok(UInt160::from_script(&multisig_redeem_script(m, keys)?))
}

/// The consensus address: `n - (n - 1) / 3` of the validators.
pub fn bft_address(validators: &[PublicKey]) -> Result<UInt160> {
    let n = validators.len();
    multisig_account(n - n.saturating_sub(1) / 3, validators)
}

/// The committee address: a majority of the committee members.
pub fn committee_address(committee: &[PublicKey]) -> Result<UInt160> {
    let n = committee.len();
    multisig_account(n - n.saturating_sub(1) / 2, committee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const KEYS: [&str; 3] = [
        "03b209fd4f53a7170ea4444e0cb0a6bb6a53c2bd016926989cf85f9b0fba17a70c",
        "02df48f60e8f3e01c48ff40b9b7f1310d7a8b2a193188befe1c2e3df740e895093",
        "03b8d9d5771d8f513aa0869b9cc8d50986403b78c6da36890638c3d46a5adce04a",
    ];

    fn keys() -> Vec<PublicKey> {
        KEYS.iter().map(|k| PublicKey::from_str(k).unwrap()).collect()
    }

    #[test]
    fn signature_script_layout() {
        let key = keys()[0];
        let script = signature_redeem_script(&key);
        assert_eq!(script.len(), 40);
        assert_eq!(&script[..2], &[0x0c, 33]);
        assert_eq!(script[35], 0x41);
        assert_eq!(&script[36..], &0x27b3_e756u32.to_le_bytes());
    }

    #[test]
    fn multisig_keys_are_sorted() {
        let mut reversed = keys();
        reversed.reverse();
        assert_eq!(
            multisig_redeem_script(2, &keys()).unwrap(),
            multisig_redeem_script(2, &reversed).unwrap()
        );
        let script = multisig_redeem_script(2, &keys()).unwrap();
        assert_eq!(script[0], 0x12);
        assert_eq!(script[script.len() - 6], 0x13);
        assert!(multisig_redeem_script(4, &keys()).is_err());
        assert!(multisig_redeem_script(0, &keys()).is_err());
    }

    #[test]
    fn committee_and_bft_thresholds() {
        let keys = keys();
        assert_eq!(committee_address(&keys).unwrap(), multisig_account(2, &keys).unwrap());
        assert_eq!(bft_address(&keys).unwrap(), multisig_account(3, &keys).unwrap());
        assert_eq!(
            bft_address(&keys[..1]).unwrap(),
            multisig_account(1, &keys[..1]).unwrap()
        );
    }
}

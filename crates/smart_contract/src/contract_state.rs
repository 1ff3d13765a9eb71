//! Deployed contract records and the NEF container.

use crate::manifest::ContractManifest;
use crate::Result;
use base64::{engine::general_purpose, Engine as _};
use neo_core::{hashing, UInt160};
use neo_vm::op_code::OpCode;
use neo_vm::{CallFlags, ScriptBuilder, StackItem};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Magic number at the start of a NEF file ("NEF3").
pub const NEF_MAGIC: u32 = 0x3346_454E;

/// Width of the fixed compiler field of a NEF file.
pub const NEF_COMPILER_SIZE: usize = 64;

/// Represents the state of a deployed smart contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractState {
    /// Native contracts use negative ids.
    pub id: i32,
    #[serde(rename = "updatecounter")]
    pub update_counter: u16,
    pub hash: UInt160,
    pub nef: NefFile,
    pub manifest: ContractManifest,
}

impl ContractState {
    pub fn new(id: i32, hash: UInt160, nef: NefFile, manifest: ContractManifest) -> Self {
        Self {
            id,
            update_counter: 0,
            hash,
            nef,
            manifest,
        }
    }

    /// The contract script.
    pub fn script(&self) -> &[u8] {
        &self.nef.script
    }

    /// Computes the hash of a contract deployed by `sender`:
    /// `hash160(ABORT, push sender, push checksum, push name)`.
    pub fn calculate_hash(sender: &UInt160, nef_checksum: u32, name: &str) -> UInt160 {
        let mut builder = ScriptBuilder::new();
        builder
            .emit_opcode(OpCode::ABORT)
            .emit_push(sender.as_bytes())
            .emit_push_int(i64::from(nef_checksum))
            .emit_push_string(name);
        UInt160::from_script(&builder.to_array())
    }

    /// Converts the record into the array returned to scripts:
    /// `[id, updatecounter, hash, nef, manifest]`, with the NEF in its binary
    /// form and the manifest as JSON.
    pub fn to_stack_item(&self) -> Result<StackItem> {
        Ok(StackItem::from_array(vec![
            StackItem::from_int(self.id),
            StackItem::from_int(self.update_counter),
            StackItem::from_byte_string(self.hash.to_vec()),
            StackItem::from_byte_string(self.nef.to_bytes()),
            StackItem::from_byte_string(self.manifest.to_json()?),
        ]))
    }
}

/// A call to another contract through `CALLT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodToken {
    pub hash: UInt160,
    pub method: String,
    #[serde(rename = "paramcount")]
    pub parameters_count: u16,
    pub has_return_value: bool,
    #[serde(rename = "callflags")]
    pub call_flags: CallFlags,
}

/// Represents a NEF (Neo Executable Format) file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NefFile {
    pub compiler: String,
    pub source: String,
    pub tokens: Vec<MethodToken>,
    /// Base64 in JSON.
    #[serde(serialize_with = "to_base64", deserialize_with = "from_base64")]
    pub script: Vec<u8>,
    pub checksum: u32,
}

impl NefFile {
    /// Creates a NEF around `script` and fills in its checksum.
    pub fn new(compiler: impl Into<String>, script: Vec<u8>) -> Self {
        let mut nef = Self {
            compiler: compiler.into(),
            source: String::new(),
            tokens: Vec::new(),
            script,
            checksum: 0,
        };
        nef.checksum = nef.compute_checksum();
        nef
    }

    /// The first four bytes of `hash256` over the file without its checksum.
    pub fn compute_checksum(&self) -> u32 {
        let digest = hashing::hash256(&self.body());
        u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
    }

    /// Binary encoding of the file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.body();
        bytes.extend_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    fn body(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NEF_COMPILER_SIZE + self.script.len() + 16);
        out.extend_from_slice(&NEF_MAGIC.to_le_bytes());
        let mut compiler = self.compiler.as_bytes().to_vec();
        compiler.resize(NEF_COMPILER_SIZE, 0);
        out.extend_from_slice(&compiler);
        write_var_bytes(&mut out, self.source.as_bytes());
        out.push(0);
        write_var_int(&mut out, self.tokens.len() as u64);
        for token in &self.tokens {
            out.extend_from_slice(token.hash.as_bytes());
            write_var_bytes(&mut out, token.method.as_bytes());
            out.extend_from_slice(&token.parameters_count.to_le_bytes());
            out.push(u8::from(token.has_return_value));
            out.push(token.call_flags.bits());
        }
        out.extend_from_slice(&0u16.to_le_bytes());
        write_var_bytes(&mut out, &self.script);
        out
    }
}

fn write_var_int(out: &mut Vec<u8>, value: u64) {
    if value < 0xFD {
        out.push(value as u8);
    } else if value <= 0xFFFF {
        out.push(0xFD);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xFFFF_FFFF {
        out.push(0xFE);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(0xFF);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_var_int(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

fn to_base64<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
}

fn from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error> {
    let text = String::deserialize(deserializer)?;
    general_purpose::STANDARD
        .decode(text)
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nef_layout() {
        let nef = NefFile::new("neo-core-v3.0", vec![OpCode::RET as u8]);
        let bytes = nef.to_bytes();
        assert_eq!(&bytes[..4], b"NEF3");
        assert_eq!(&bytes[4..17], b"neo-core-v3.0");
        // magic + compiler + source + reserved + tokens + reserved + script + checksum
        assert_eq!(bytes.len(), 4 + 64 + 1 + 1 + 1 + 2 + 2 + 4);
        assert_eq!(nef.checksum, nef.compute_checksum());
        assert_eq!(&bytes[bytes.len() - 4..], &nef.checksum.to_le_bytes());
    }

    #[test]
    fn native_hashes_follow_the_deployment_formula() {
        let hash = ContractState::calculate_hash(&UInt160::zero(), 0, "PolicyContract");
        assert_eq!(
            hash.to_string(),
            "0xcc5e4edd9f5f8dba8bb65734541df7a1c081c67b"
        );
    }

    #[test]
    fn state_round_trips_through_json() {
        let nef = NefFile::new("test", vec![0x11, 0x40]);
        let state = ContractState::new(
            1,
            UInt160::from_script(&nef.script),
            nef,
            ContractManifest::new("test"),
        );
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"updatecounter\":0"));
        assert!(json.contains("\"script\":\"EUA=\""));
        let back: ContractState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}

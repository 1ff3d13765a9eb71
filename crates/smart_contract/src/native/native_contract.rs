//! Base native contract trait and types.

use crate::account::committee_address;
use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType;
use crate::contract_state::ContractState;
use crate::manifest::{ContractEvent, ContractMethod, ContractParameter};
use crate::storage::StorageKey;
use crate::{Error, Result};
use neo_core::{Hardfork, ProtocolSettings, PublicKey, UInt160, UInt256};
use neo_vm::{CallFlags, ExecutionEngine, StackItem};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::collections::BTreeSet;
use std::fmt;

/// Signature of a native method body. Arguments arrive converted per the
/// method's parameter schema.
pub type NativeHandler =
    fn(&mut EngineHost, &mut ExecutionEngine, &NativeArgs) -> Result<NativeValue>;

/// Trait for native contract implementations.
///
/// Native contracts are stateless values: everything they persist lives in
/// the engine's storage under their id.
pub trait NativeContract: Send + Sync {
    /// Storage id. Natives use negative ids.
    fn id(&self) -> i32;

    fn name(&self) -> &'static str;

    /// Hash of the contract, derived from its name.
    fn hash(&self) -> UInt160 {
        native_hash(self.name())
    }

    /// Every method the contract ever exposed, including inactive ones.
    fn methods(&self) -> &[NativeMethod];

    fn events(&self) -> Vec<NativeEvent> {
        Vec::new()
    }

    fn supported_standards(&self) -> &'static [&'static str] {
        &[]
    }

    /// Hardfork that activates the contract. `None` means genesis.
    fn active_in(&self) -> Option<Hardfork> {
        None
    }

    /// Writes initial storage. Called with `None` at genesis and with each
    /// hardfork the contract uses when it activates.
    fn initialize(
        &self,
        _host: &mut EngineHost,
        _engine: &ExecutionEngine,
        _hardfork: Option<Hardfork>,
    ) -> Result<()> {
        Ok(())
    }

    /// Hardforks that change the contract's interface.
    fn used_hardforks(&self) -> BTreeSet<Hardfork> {
        let mut hardforks: BTreeSet<Hardfork> = self
            .methods()
            .iter()
            .flat_map(|method| [method.active_in, method.deprecated_in])
            .chain(self.events().iter().map(|event| event.active_in))
            .flatten()
            .collect();
        hardforks.extend(self.active_in());
        hardforks
    }

    /// Key `[prefix]` in this contract's storage.
    fn storage_key(&self, prefix: u8) -> StorageKey {
        StorageKey::create(self.id(), prefix)
    }
}

/// Computes the hash of a native contract: the deployment hash of `name`
/// with a zero sender and checksum.
pub fn native_hash(name: &str) -> UInt160 {
    ContractState::calculate_hash(&UInt160::zero(), 0, name)
}

/// Represents a method in a native contract.
#[derive(Clone)]
pub struct NativeMethod {
    pub name: &'static str,
    pub handler: NativeHandler,
    /// Execution units, multiplied by the execution fee factor.
    pub cpu_fee: i64,
    /// Storage bytes, multiplied by the storage price.
    pub storage_fee: i64,
    pub required_call_flags: CallFlags,
    pub active_in: Option<Hardfork>,
    pub deprecated_in: Option<Hardfork>,
    pub parameters: Vec<ContractParameter>,
    pub return_type: ContractParameterType,
}

impl fmt::Debug for NativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMethod")
            .field("name", &self.name)
            .field("cpu_fee", &self.cpu_fee)
            .field("storage_fee", &self.storage_fee)
            .field("required_call_flags", &self.required_call_flags)
            .field("active_in", &self.active_in)
            .field("deprecated_in", &self.deprecated_in)
            .field("parameters", &self.parameters.len())
            .field("return_type", &self.return_type)
            .finish()
    }
}

impl NativeMethod {
    /// Safe methods only read state.
    pub fn safe(&self) -> bool {
        (self.required_call_flags & !CallFlags::READ_ONLY).is_empty()
    }

    /// Sets the parameter schema.
    pub fn params(&mut self, parameters: &[(&str, ContractParameterType)]) -> &mut Self {
        self.parameters = parameters
            .iter()
            .map(|(name, parameter_type)| ContractParameter::new(*name, *parameter_type))
            .collect();
        self
    }

    pub fn returns(&mut self, return_type: ContractParameterType) -> &mut Self {
        self.return_type = return_type;
        self
    }

    pub fn deprecated_in(&mut self, hardfork: Hardfork) -> &mut Self {
        self.deprecated_in = Some(hardfork);
        self
    }

    /// Active at `height`: activated and not yet deprecated.
    pub fn is_active(&self, settings: &ProtocolSettings, height: u32) -> bool {
        self.active_in
            .map_or(true, |hf| settings.is_hardfork_enabled(hf, height))
            && self
                .deprecated_in
                .map_or(true, |hf| !settings.is_hardfork_enabled(hf, height))
    }

    /// ABI entry for the method at `offset`.
    pub fn descriptor(&self, offset: usize) -> ContractMethod {
        ContractMethod {
            name: self.name.to_string(),
            parameters: self.parameters.clone(),
            return_type: self.return_type,
            offset: offset as i32,
            safe: self.safe(),
        }
    }
}

/// The method list a native contract builds at construction.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: Vec<NativeMethod>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method with no parameters and no return value. Describe it
    /// further through the returned handle.
    pub fn register_method(
        &mut self,
        name: &'static str,
        handler: NativeHandler,
        cpu_fee: i64,
        storage_fee: i64,
        required_call_flags: CallFlags,
        active_in: Option<Hardfork>,
    ) -> &mut NativeMethod {
        self.methods.push(NativeMethod {
            name,
            handler,
            cpu_fee,
            storage_fee,
            required_call_flags,
            active_in,
            deprecated_in: None,
            parameters: Vec::new(),
            return_type: ContractParameterType::Void,
        });
        let last = self.methods.len() - 1;
        &mut self.methods[last]
    }

    pub fn as_slice(&self) -> &[NativeMethod] {
        &self.methods
    }
}

/// An event declared by a native contract.
#[derive(Debug, Clone)]
pub struct NativeEvent {
    pub name: &'static str,
    pub parameters: Vec<ContractParameter>,
    pub active_in: Option<Hardfork>,
}

impl NativeEvent {
    pub fn new(name: &'static str, parameters: &[(&str, ContractParameterType)]) -> Self {
        Self {
            name,
            parameters: parameters
                .iter()
                .map(|(name, parameter_type)| ContractParameter::new(*name, *parameter_type))
                .collect(),
            active_in: None,
        }
    }

    pub fn since(mut self, hardfork: Hardfork) -> Self {
        self.active_in = Some(hardfork);
        self
    }

    pub fn descriptor(&self) -> ContractEvent {
        ContractEvent {
            name: self.name.to_string(),
            parameters: self.parameters.clone(),
        }
    }
}

/// A value crossing the native boundary.
#[derive(Debug, Clone)]
pub enum NativeValue {
    /// No return value.
    Void,
    Null,
    Boolean(bool),
    Integer(BigInt),
    Bytes(Vec<u8>),
    String(String),
    Hash160(UInt160),
    Hash256(UInt256),
    PublicKey(PublicKey),
    Array(Vec<NativeValue>),
    Map(Vec<(NativeValue, NativeValue)>),
    Item(StackItem),
}

impl NativeValue {
    /// An array of values.
    pub fn array<T: Into<NativeValue>>(values: impl IntoIterator<Item = T>) -> Self {
        NativeValue::Array(values.into_iter().map(Into::into).collect())
    }

    /// Converts an argument for a parameter of type `parameter_type`.
    pub fn from_argument(item: StackItem, parameter_type: ContractParameterType) -> Result<Self> {
        use ContractParameterType as T;
        let invalid = |item: &StackItem| {
            Error::invalid_argument(format!(
                "cannot convert {} to {parameter_type}",
                item.stack_item_type()
            ))
        };
        Ok(match parameter_type {
            T::Any => {
                if item.is_null() {
                    NativeValue::Null
                } else {
                    NativeValue::Item(item)
                }
            }
            T::Boolean => NativeValue::Boolean(item.get_boolean()?),
            T::Integer => NativeValue::Integer(item.get_integer()?),
            T::ByteArray | T::Signature => {
                if item.is_null() {
                    NativeValue::Null
                } else {
                    NativeValue::Bytes(item.get_bytes()?)
                }
            }
            T::String => NativeValue::String(item.get_string()?),
            T::Hash160 => NativeValue::Hash160(UInt160::from_bytes(&item.get_bytes()?)?),
            T::Hash256 => NativeValue::Hash256(UInt256::from_bytes(&item.get_bytes()?)?),
            T::PublicKey => NativeValue::PublicKey(PublicKey::from_bytes(&item.get_bytes()?)?),
            T::Array => match item {
                StackItem::Array(_) | StackItem::Struct(_) => NativeValue::Item(item),
                other => return Err(invalid(&other)),
            },
            T::Map => match item {
                StackItem::Map(_) => NativeValue::Item(item),
                other => return Err(invalid(&other)),
            },
            T::InteropInterface => match item {
                StackItem::InteropInterface(_) => NativeValue::Item(item),
                other => return Err(invalid(&other)),
            },
            T::Void => return Err(invalid(&item)),
        })
    }

    /// Converts a return value to the stack item pushed for the caller.
    pub fn into_stack_item(self) -> Result<StackItem> {
        Ok(match self {
            NativeValue::Void | NativeValue::Null => StackItem::Null,
            NativeValue::Boolean(value) => StackItem::from_bool(value),
            NativeValue::Integer(value) => StackItem::checked_int(value)?,
            NativeValue::Bytes(bytes) => StackItem::from_byte_string(bytes),
            NativeValue::String(value) => StackItem::from_byte_string(value.into_bytes()),
            NativeValue::Hash160(hash) => StackItem::from_byte_string(hash.to_vec()),
            NativeValue::Hash256(hash) => StackItem::from_byte_string(hash.to_vec()),
            NativeValue::PublicKey(key) => StackItem::from_byte_string(key.to_vec()),
            NativeValue::Array(values) => StackItem::from_array(
                values
                    .into_iter()
                    .map(NativeValue::into_stack_item)
                    .collect::<Result<_>>()?,
            ),
            NativeValue::Map(entries) => StackItem::from_map(
                entries
                    .into_iter()
                    .map(|(key, value)| Ok((key.into_stack_item()?, value.into_stack_item()?)))
                    .collect::<Result<Vec<_>>>()?,
            ),
            NativeValue::Item(item) => item,
        })
    }
}

macro_rules! native_value_from {
    ($($source:ty => $variant:ident $(via $convert:path)?),* $(,)?) => {
        $(
            impl From<$source> for NativeValue {
                fn from(value: $source) -> Self {
                    NativeValue::$variant($($convert)?(value))
                }
            }
        )*
    };
}

native_value_from! {
    bool => Boolean,
    BigInt => Integer,
    i64 => Integer via BigInt::from,
    i32 => Integer via BigInt::from,
    u32 => Integer via BigInt::from,
    u8 => Integer via BigInt::from,
    Vec<u8> => Bytes,
    String => String,
    UInt160 => Hash160,
    UInt256 => Hash256,
    PublicKey => PublicKey,
    StackItem => Item,
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::String(value.to_string())
    }
}

impl From<()> for NativeValue {
    fn from(_: ()) -> Self {
        NativeValue::Void
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(NativeValue::Null, Into::into)
    }
}

/// Converted arguments of a native call, argument 0 first.
#[derive(Debug, Clone, Default)]
pub struct NativeArgs {
    values: Vec<NativeValue>,
}

impl NativeArgs {
    pub fn new(values: Vec<NativeValue>) -> Self {
        Self { values }
    }

    /// Converts raw stack items against the parameter schema.
    pub fn convert(items: Vec<StackItem>, parameters: &[ContractParameter]) -> Result<Self> {
        if items.len() != parameters.len() {
            return Err(Error::invalid_argument(format!(
                "expected {} argument(s), got {}",
                parameters.len(),
                items.len()
            )));
        }
        let values = items
            .into_iter()
            .zip(parameters)
            .map(|(item, parameter)| NativeValue::from_argument(item, parameter.parameter_type))
            .collect::<Result<_>>()?;
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&NativeValue> {
        self.values
            .get(index)
            .ok_or_else(|| Error::invalid_argument(format!("missing argument {index}")))
    }

    fn mismatch(&self, index: usize, expected: &str) -> Error {
        Error::invalid_argument(format!("argument {index} is not {expected}"))
    }

    pub fn integer(&self, index: usize) -> Result<BigInt> {
        match self.get(index)? {
            NativeValue::Integer(value) => Ok(value.clone()),
            _ => Err(self.mismatch(index, "an integer")),
        }
    }

    pub fn i64(&self, index: usize) -> Result<i64> {
        self.integer(index)?
            .to_i64()
            .ok_or_else(|| Error::invalid_argument(format!("argument {index} does not fit i64")))
    }

    pub fn u32(&self, index: usize) -> Result<u32> {
        self.integer(index)?
            .to_u32()
            .ok_or_else(|| Error::invalid_argument(format!("argument {index} does not fit u32")))
    }

    pub fn boolean(&self, index: usize) -> Result<bool> {
        match self.get(index)? {
            NativeValue::Boolean(value) => Ok(*value),
            _ => Err(self.mismatch(index, "a boolean")),
        }
    }

    pub fn bytes(&self, index: usize) -> Result<Vec<u8>> {
        match self.get(index)? {
            NativeValue::Bytes(bytes) => Ok(bytes.clone()),
            _ => Err(self.mismatch(index, "a byte array")),
        }
    }

    pub fn string(&self, index: usize) -> Result<String> {
        match self.get(index)? {
            NativeValue::String(value) => Ok(value.clone()),
            _ => Err(self.mismatch(index, "a string")),
        }
    }

    pub fn hash160(&self, index: usize) -> Result<UInt160> {
        match self.get(index)? {
            NativeValue::Hash160(hash) => Ok(*hash),
            _ => Err(self.mismatch(index, "a script hash")),
        }
    }

    pub fn public_key(&self, index: usize) -> Result<PublicKey> {
        match self.get(index)? {
            NativeValue::PublicKey(key) => Ok(*key),
            _ => Err(self.mismatch(index, "a public key")),
        }
    }

    pub fn item(&self, index: usize) -> Result<StackItem> {
        match self.get(index)? {
            NativeValue::Item(item) => Ok(item.clone()),
            NativeValue::Null => Ok(StackItem::Null),
            _ => Err(self.mismatch(index, "a stack item")),
        }
    }

    /// Elements of an Array or Struct argument.
    pub fn array(&self, index: usize) -> Result<Vec<StackItem>> {
        match self.get(index)? {
            NativeValue::Item(StackItem::Array(array)) => Ok(array.to_vec()),
            NativeValue::Item(StackItem::Struct(fields)) => Ok(fields.to_vec()),
            _ => Err(self.mismatch(index, "an array")),
        }
    }
}

/// Fails unless the committee multi-signature witnessed the call.
pub fn assert_committee(host: &EngineHost, engine: &ExecutionEngine) -> Result<()> {
    let committee = super::neo_token::committee(host.settings());
    let address = committee_address(&committee)?;
    if host.check_witness(engine, &address)? {
        Ok(())
    } else {
        Err(Error::native("invalid committee signature"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(NativeValue::Void)
    }

    #[test]
    fn method_safety_follows_call_flags() {
        let mut table = MethodTable::new();
        table.register_method("get", noop, 1 << 15, 0, CallFlags::READ_STATES, None);
        table.register_method("set", noop, 1 << 15, 0, CallFlags::STATES, None);
        table.register_method("pure", noop, 1 << 15, 0, CallFlags::NONE, None);
        let safety: Vec<bool> = table.as_slice().iter().map(NativeMethod::safe).collect();
        assert_eq!(safety, vec![true, false, true]);
    }

    #[test]
    fn activation_window() {
        let mut table = MethodTable::new();
        table
            .register_method("old", noop, 0, 0, CallFlags::NONE, None)
            .deprecated_in(Hardfork::HF_Cockatrice);
        table.register_method("new", noop, 0, 0, CallFlags::NONE, Some(Hardfork::HF_Cockatrice));
        let settings = ProtocolSettings {
            hardforks: [(Hardfork::HF_Cockatrice, 10)].into_iter().collect(),
            ..ProtocolSettings::default()
        };
        let [old, new] = table.as_slice() else {
            panic!("expected two methods");
        };
        assert!(old.is_active(&settings, 9));
        assert!(!old.is_active(&settings, 10));
        assert!(!new.is_active(&settings, 9));
        assert!(new.is_active(&settings, 10));
    }

    #[test]
    fn argument_conversion() {
        let parameters = vec![
            ContractParameter::new("account", ContractParameterType::Hash160),
            ContractParameter::new("amount", ContractParameterType::Integer),
            ContractParameter::new("data", ContractParameterType::Any),
        ];
        let args = NativeArgs::convert(
            vec![
                StackItem::from_byte_string(vec![7; 20]),
                StackItem::from_int(42),
                StackItem::Null,
            ],
            &parameters,
        )
        .unwrap();
        assert_eq!(args.hash160(0).unwrap(), UInt160::from_array([7; 20]));
        assert_eq!(args.i64(1).unwrap(), 42);
        assert!(args.item(2).unwrap().is_null());
        assert!(args.string(1).is_err());

        let short = NativeArgs::convert(
            vec![StackItem::from_byte_string(vec![7; 19]), StackItem::from_int(1), StackItem::Null],
            &parameters,
        );
        assert!(short.is_err());
    }

    #[test]
    fn return_values_become_stack_items() {
        let value = NativeValue::array([1i64, 2]);
        assert_eq!(
            format!("{:?}", value.into_stack_item().unwrap()),
            format!("{:?}", StackItem::from_array(vec![StackItem::from_int(1), StackItem::from_int(2)]))
        );
        assert_eq!(
            NativeValue::from(None::<UInt160>).into_stack_item().unwrap(),
            StackItem::Null
        );
        assert_eq!(
            NativeValue::from("NEO").into_stack_item().unwrap(),
            StackItem::from_byte_string("NEO")
        );
    }
}

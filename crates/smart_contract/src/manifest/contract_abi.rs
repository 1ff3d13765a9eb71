//! The ABI section of a contract manifest.

use crate::contract_parameter_type::ContractParameterType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub parameter_type: ContractParameterType,
}

impl ContractParameter {
    pub fn new(name: impl Into<String>, parameter_type: ContractParameterType) -> Self {
        Self {
            name: name.into(),
            parameter_type,
        }
    }
}

/// A method exposed by a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMethod {
    pub name: String,
    pub parameters: Vec<ContractParameter>,
    #[serde(rename = "returntype")]
    pub return_type: ContractParameterType,
    /// Entry position of the method in the contract script.
    pub offset: i32,
    /// Safe methods cannot change state or emit notifications.
    pub safe: bool,
}

/// An event a contract may emit through `System.Runtime.Notify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub name: String,
    pub parameters: Vec<ContractParameter>,
}

/// Methods and events of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractAbi {
    pub methods: Vec<ContractMethod>,
    pub events: Vec<ContractEvent>,
}

impl ContractAbi {
    /// Finds a method by name and parameter count. A negative count matches
    /// the first method with that name.
    pub fn get_method(&self, name: &str, parameter_count: i32) -> Option<&ContractMethod> {
        self.methods.iter().find(|method| {
            method.name == name
                && (parameter_count < 0 || method.parameters.len() == parameter_count as usize)
        })
    }

    pub fn get_event(&self, name: &str) -> Option<&ContractEvent> {
        self.events.iter().find(|event| event.name == name)
    }

    /// Rejects overloads with the same arity and duplicate event names.
    pub fn validate(&self) -> Result<()> {
        let mut methods = HashSet::new();
        for method in &self.methods {
            if method.name.is_empty() {
                return Err(Error::InvalidManifest("method name is empty".into()));
            }
            if method.offset < 0 {
                return Err(Error::InvalidManifest(format!(
                    "method {} has a negative offset",
                    method.name
                )));
            }
            if !methods.insert((method.name.as_str(), method.parameters.len())) {
                return Err(Error::InvalidManifest(format!(
                    "duplicate method {}/{}",
                    method.name,
                    method.parameters.len()
                )));
            }
        }
        let mut events = HashSet::new();
        for event in &self.events {
            if !events.insert(event.name.as_str()) {
                return Err(Error::InvalidManifest(format!(
                    "duplicate event {}",
                    event.name
                )));
            }
        }
        Ok(())
    }
}

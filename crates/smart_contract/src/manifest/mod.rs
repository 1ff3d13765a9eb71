//! Contract manifests: ABI, groups, permissions and trusts.

pub mod contract_abi;
pub mod contract_group;
pub mod contract_manifest;
pub mod contract_permission;
pub mod wildcard_container;

pub use contract_abi::{ContractAbi, ContractEvent, ContractMethod, ContractParameter};
pub use contract_group::ContractGroup;
pub use contract_manifest::{ContractManifest, MAX_MANIFEST_LENGTH};
pub use contract_permission::{ContractPermission, ContractPermissionDescriptor};
pub use wildcard_container::WildcardContainer;

pub mod descriptor;
pub mod registry;

pub use descriptor::{AppDescriptor, ConnectionType, DescriptorPatch};
pub use registry::{AppRegistry, RegistryError};

// Read-only monitor endpoints, resolved through the registry like every
// other resource operation.

use serde_json::Value;

use crate::error::CoreError;
use crate::resource::Resources;

impl Resources<'_> {
    pub async fn system_status(&self, device_id: &str) -> Result<Value, CoreError> {
        let session = self.registry().get(device_id)?;
        Ok(session.system_status().await?)
    }

    pub async fn vdoms(&self, device_id: &str) -> Result<Value, CoreError> {
        let session = self.registry().get(device_id)?;
        Ok(session.vdoms().await?)
    }

    pub async fn interface_status(
        &self,
        device_id: &str,
        interface: &str,
        vdom: Option<&str>,
    ) -> Result<Value, CoreError> {
        if interface.trim().is_empty() {
            return Err(CoreError::missing("interface_name"));
        }
        let session = self.registry().get(device_id)?;
        Ok(session.interface_status(interface.trim(), vdom).await?)
    }

    pub async fn routing_table(&self, device_id: &str, vdom: Option<&str>) -> Result<Value, CoreError> {
        let session = self.registry().get(device_id)?;
        Ok(session.routing_table(vdom).await?)
    }
}

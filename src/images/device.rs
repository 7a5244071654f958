// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//!Cross-platform device wrappers
use crate::entry_point::EntryPoint;
use crate::images::view::View;
use crate::imp;

///Cross-platform unbound device
pub(crate) struct UnboundDevice(pub(crate) crate::imp::UnboundDevice);
impl UnboundDevice {
    ///Pick a device for the associated view
    pub async fn pick(view: &View, entry_point: &EntryPoint) -> Result<UnboundDevice, PickError> {
        crate::imp::UnboundDevice::pick(view, entry_point)
            .await
            .map(UnboundDevice)
            .map_err(PickError)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct PickError(imp::Error);

///Cross-platform bound device.  Clones share the same GPU resources.
#[derive(Debug, Clone)]
pub struct BoundDevice(pub(crate) imp::BoundDevice);

impl AsRef<imp::BoundDevice> for BoundDevice {
    fn as_ref(&self) -> &imp::BoundDevice {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BindError(imp::Error);

impl BoundDevice {
    pub(crate) async fn bind(unbound_device: UnboundDevice) -> Result<Self, BindError> {
        let bind = crate::imp::BoundDevice::bind(unbound_device)
            .await
            .map_err(BindError)?;
        Ok(Self(bind))
    }

    /// Largest texture side the device accepts.
    pub fn max_texture_side(&self) -> u32 {
        self.0.max_texture_side()
    }
}

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The GPU instance every engine starts from.

/// Wraps the backend instance.  Backends are picked from the environment
/// (`WGPU_BACKEND` and friends) with wgpu's defaults otherwise.
#[derive(Debug)]
pub struct EntryPoint(pub(crate) crate::imp::EntryPoint);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct EntryPointError(crate::imp::Error);

impl EntryPoint {
    pub async fn new() -> Result<Self, EntryPointError> {
        crate::imp::EntryPoint::new()
            .await
            .map(EntryPoint)
            .map_err(EntryPointError)
    }
}

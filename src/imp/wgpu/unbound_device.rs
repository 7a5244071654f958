// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::images::view::View;

pub struct UnboundDevice {
    pub(super) adapter: wgpu::Adapter,
}

impl UnboundDevice {
    /// Picks an adapter able to present to `view`, or any adapter for headless views.
    pub async fn pick(
        view: &View,
        entry_point: &crate::entry_point::EntryPoint,
    ) -> Result<UnboundDevice, super::Error> {
        let options = wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: view.surface().map(|s| s.wgpu_surface()),
        };
        let adapter = entry_point.0.0.request_adapter(&options).await;
        let adapter = adapter.map_err(|_| super::Error::NoSuchAdapter)?;
        logwise::info_sync!(
            "picked adapter {info}",
            info = logwise::privacy::LogIt(&adapter.get_info())
        );
        Ok(UnboundDevice { adapter })
    }
}

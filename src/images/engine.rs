// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::entry_point::{EntryPoint, EntryPointError};
use crate::images::device::BoundDevice;
use crate::images::device::{BindError, PickError, UnboundDevice};
use crate::images::view::{Impl, View};
use crate::imp;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

/// An instance plus the device bound for it.
#[derive(Debug)]
pub struct Engine {
    //note that drop order is significant here.
    device: Arc<BoundDevice>,
    _entry_point: Arc<EntryPoint>,
}

impl Engine {
    /// An engine on any available adapter, for rendering to [View::headless].
    pub async fn headless() -> Result<Arc<Self>, CreateError> {
        let entry_point = Arc::new(EntryPoint::new().await?);
        Self::rendering_to(&View::headless(), entry_point).await
    }

    /**
    An engine able to present to `window`, and the view that does it.

    The adapter is chosen to be compatible with the window's surface.
    */
    pub async fn for_window<W>(window: Arc<W>) -> Result<(Arc<Self>, View), CreateError>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let entry_point = Arc::new(EntryPoint::new().await?);
        let surface = imp::Surface::new(&entry_point, window).map_err(CreateError::Surface)?;
        let view = View(Impl::Surface(surface));
        let engine = Self::rendering_to(&view, entry_point).await?;
        Ok((engine, view))
    }

    async fn rendering_to(
        view: &View,
        entry_point: Arc<EntryPoint>,
    ) -> Result<Arc<Self>, CreateError> {
        logwise::info_sync!("Engine::rendering_to() started");
        let unbound_device = UnboundDevice::pick(view, &entry_point).await?;
        let bound_device = Arc::new(BoundDevice::bind(unbound_device).await?);
        logwise::info_sync!("Engine::rendering_to() completed");
        Ok(Arc::new(Engine {
            device: bound_device,
            _entry_point: entry_point,
        }))
    }

    pub fn bound_device(&self) -> &Arc<BoundDevice> {
        &self.device
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CreateError {
    #[error("Can't create engine {0}")]
    EntryPoint(#[from] EntryPointError),
    #[error("Can't find a GPU {0}")]
    Gpu(#[from] PickError),
    #[error("Can't bind GPU {0}")]
    Bind(#[from] BindError),
    #[error("Can't create surface {0}")]
    Surface(imp::Error),
}

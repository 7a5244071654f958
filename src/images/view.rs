// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Where rendered frames go.

A headless view keeps the displayed image in an off-screen texture, which
[Compositor::read_screen](crate::compositor::Compositor::read_screen) can read back.  A
surface view presents to a window; create one with
[Engine::for_window](crate::images::Engine::for_window).
*/

#[derive(Debug)]
pub(crate) enum Impl {
    Headless,
    Surface(crate::imp::Surface),
}

#[derive(Debug)]
pub struct View(pub(crate) Impl);

impl View {
    pub fn headless() -> Self {
        View(Impl::Headless)
    }

    pub fn is_headless(&self) -> bool {
        matches!(self.0, Impl::Headless)
    }

    pub(crate) fn surface(&self) -> Option<&crate::imp::Surface> {
        match &self.0 {
            Impl::Headless => None,
            Impl::Surface(surface) => Some(surface),
        }
    }

    pub(crate) fn surface_mut(&mut self) -> Option<&mut crate::imp::Surface> {
        match &mut self.0 {
            Impl::Headless => None,
            Impl::Surface(surface) => Some(surface),
        }
    }
}

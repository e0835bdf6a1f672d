/// Reports the system appearance that default colors are derived from.
pub trait Appearance: Send + Sync {
    fn is_dark_mode(&self) -> bool;
}

#[derive(Debug, Default)]
pub struct FixedAppearance(std::sync::atomic::AtomicBool);

impl FixedAppearance {
    pub fn new(dark: bool) -> Self { FixedAppearance(std::sync::atomic::AtomicBool::new(dark)) }

    pub fn set_dark_mode(&self, dark: bool) {
        self.0.store(dark, std::sync::atomic::Ordering::Relaxed);
    }
}

impl Appearance for FixedAppearance {
    fn is_dark_mode(&self) -> bool { self.0.load(std::sync::atomic::Ordering::Relaxed) }
}

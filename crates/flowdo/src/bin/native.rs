#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    flowdo::native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The canvas app only ships as a native binary.
}

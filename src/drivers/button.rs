use esp_hal::gpio::Input;

/// The single push button, wired active low against the internal pull-up
pub struct Button<'d> {
    input: Input<'d>,
}

impl<'d> Button<'d> {
    pub fn new(input: Input<'d>) -> Self {
        Self { input }
    }

    /// Raw level, debouncing happens in the core
    pub fn is_pressed(&self) -> bool {
        self.input.is_low()
    }
}

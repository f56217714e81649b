/// Values with a width in local variable slots (eg. `long` and `double` take two slots)
pub trait Width {
    fn width(&self) -> usize;
}

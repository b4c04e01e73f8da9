use custom_error::custom_error;

custom_error! {pub PaletteError
    Empty = "Palette does not contain any colors",
    InvalidSize {size: usize} = "Palette must contain exactly 256 colors, got {size}",
}

custom_error! {pub CanvasError
    InvalidDimensions {width: usize, height: usize} = "Canvas dimensions {width}x{height} must be within 1..=65535",
}

custom_error! {pub GIFEncoderError
    FrameSizeMismatch {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize
    } = "Frame of size {width}x{height} does not match canvas of size {expected_width}x{expected_height}",
    InvalidPalette {source: PaletteError} = "Invalid palette: {source}",
    InvalidCanvas {source: CanvasError} = "Invalid canvas: {source}",
    InvalidOptions {description: String} = "Invalid encoder options: {description}",
    Io {source: std::io::Error} = "Failed to write gif: {source}",
}

use fastraw_core::frame::DecodedImage;

/// Copy a displayable bitmap into an egui texture image.
pub fn to_color_image(image: &DecodedImage) -> egui::ColorImage {
    let (w, h) = image.dimensions();
    let size = [w as usize, h as usize];
    if image.has_alpha() {
        egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw())
    } else {
        egui::ColorImage::from_rgb(size, image.as_raw())
    }
}

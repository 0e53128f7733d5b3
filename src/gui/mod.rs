use std::sync::Arc;

use druid::piet::ImageFormat;
use druid::ImageBuf;
use image::RgbImage;

pub mod widget;

pub fn convert_image(img: &RgbImage) -> ImageBuf {
    let raw: Arc<[u8]> = img.as_raw().clone().into();

    ImageBuf::from_raw(
        raw,
        ImageFormat::Rgb,
        img.width() as usize,
        img.height() as usize,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_convert_keeps_size_and_pixels() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([1, 2, 3]));
        let buf = convert_image(&img);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
        assert_eq!(&buf.raw_pixels()[15..18], &[1, 2, 3]);
    }
}

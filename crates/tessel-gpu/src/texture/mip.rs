use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Levels in a full chain down to 1x1: `floor(log2(max(w, h))) + 1`.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    u32::BITS - width.max(height).max(1).leading_zeros()
}

/// Every mip level of `base`, level 0 first.
///
/// Each level halves the previous one (never below 1 pixel per axis) with a
/// triangle filter.
pub fn mip_chain(base: &RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height());
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base.clone());

    for level in 1..levels {
        let width = (base.width() >> level).max(1);
        let height = (base.height() >> level).max(1);
        let previous = &chain[chain.len() - 1];
        let next = imageops::resize(previous, width, height, FilterType::Triangle);
        chain.push(next);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_counts() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(640, 480), 10);
        assert_eq!(mip_level_count(1, 300), 9);
    }

    #[test]
    fn chain_halves_each_axis_down_to_one() {
        let base = RgbaImage::new(8, 2);
        let sizes: Vec<_> = mip_chain(&base).iter().map(|l| l.dimensions()).collect();
        assert_eq!(sizes, [(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn solid_color_survives_every_level() {
        let red = image::Rgba([255, 0, 0, 255]);
        let base = RgbaImage::from_pixel(2, 2, red);

        let chain = mip_chain(&base);
        assert_eq!(chain.len(), 2);
        for level in &chain {
            assert!(level.pixels().all(|p| *p == red));
        }
    }
}

pub mod summary;

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use log::warn;

use crate::model::constants::{HEIGHT, IMAGE_DIM, WIDTH};

/// Tile rows of the sample grid; columns grow with the batch.
pub const GRID_ROWS: usize = 4;
const SEPARATOR: u32 = 1;

/// One flattened image with intensities in [0, 1] to an 8-bit grayscale image.
pub fn float_vec_to_image(data: &[f32], height: usize, width: usize) -> Option<GrayImage> {
    let expected_len = width * height;
    if data.len() != expected_len {
        warn!(
            "Mismatched data length. Expected {}, got {}.",
            expected_len,
            data.len()
        );
        return None;
    }

    let raw_pixels: Vec<u8> = data
        .iter()
        .map(|&val| (val * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect();

    ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width as u32, height as u32, raw_pixels)
}

/// Lays out every image of a flattened batch on a grid of `GRID_ROWS` rows,
/// filled row by row, each tile framed by a thin gray separator. 16 images
/// give a 4x4 grid, 32 a 4x8 one. Missing tiles stay black.
pub fn sample_grid(images: &[f32]) -> Option<GrayImage> {
    if images.is_empty() || images.len() % IMAGE_DIM != 0 {
        warn!(
            "Image batch of {} values is not a multiple of {}.",
            images.len(),
            IMAGE_DIM
        );
        return None;
    }

    let tile_w = WIDTH as u32 + 2 * SEPARATOR;
    let tile_h = HEIGHT as u32 + 2 * SEPARATOR;
    let count = images.len() / IMAGE_DIM;
    let columns = count.div_ceil(GRID_ROWS) as u32;
    let rows = count.div_ceil(columns as usize) as u32;
    let mut grid = GrayImage::new(columns * tile_w, rows * tile_h);

    for (i, sample) in images.chunks(IMAGE_DIM).enumerate() {
        let tile = float_vec_to_image(sample, HEIGHT, WIDTH)?;
        let x0 = (i as u32 % columns) * tile_w;
        let y0 = (i as u32 / columns) * tile_h;

        for (x, y, pixel) in tile.enumerate_pixels() {
            grid.put_pixel(x0 + SEPARATOR + x, y0 + SEPARATOR + y, *pixel);
        }
        draw_hollow_rect_mut(
            &mut grid,
            Rect::at(x0 as i32, y0 as i32).of_size(tile_w, tile_h),
            Luma([96u8]),
        );
    }

    Some(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensities_map_to_gray_levels() {
        let mut data = vec![0.0; IMAGE_DIM];
        data[0] = 1.0;
        data[1] = 0.5;
        data[2] = 1.7;

        let img = float_vec_to_image(&data, HEIGHT, WIDTH).unwrap();
        assert_eq!(img.dimensions(), (WIDTH as u32, HEIGHT as u32));
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert_eq!(img.get_pixel(1, 0)[0], 128);
        assert_eq!(img.get_pixel(2, 0)[0], 255);
        assert_eq!(img.get_pixel(3, 0)[0], 0);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(float_vec_to_image(&[0.5; 10], HEIGHT, WIDTH).is_none());
        assert!(sample_grid(&[0.5; IMAGE_DIM + 1]).is_none());
        assert!(sample_grid(&[]).is_none());
    }

    #[test]
    fn sixteen_samples_fill_a_square_grid() {
        let mut images = vec![0.0; 16 * IMAGE_DIM];
        // Sample 5 lands on row 1, column 1.
        images[5 * IMAGE_DIM] = 1.0;

        let grid = sample_grid(&images).unwrap();
        let tile = WIDTH as u32 + 2 * SEPARATOR;
        assert_eq!(grid.dimensions(), (4 * tile, 4 * tile));
        assert_eq!(grid.get_pixel(tile + SEPARATOR, tile + SEPARATOR)[0], 255);
        assert_eq!(grid.get_pixel(tile, tile)[0], 96);
        assert_eq!(grid.pixels().filter(|p| p[0] == 255).count(), 1);
    }

    #[test]
    fn thirty_two_samples_are_all_rendered() {
        let mut images = vec![0.0; 32 * IMAGE_DIM];
        images[31 * IMAGE_DIM] = 1.0;

        let grid = sample_grid(&images).unwrap();
        let tile = WIDTH as u32 + 2 * SEPARATOR;
        assert_eq!(grid.dimensions(), (8 * tile, 4 * tile));
        // Last sample sits on row 3, column 7.
        assert_eq!(grid.get_pixel(7 * tile + SEPARATOR, 3 * tile + SEPARATOR)[0], 255);
    }
}

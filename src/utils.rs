use make_it_braille::BrailleImg;

use crate::error::EvalError;

/// Index of the largest value; the lowest index wins a tie.
pub fn index_of_max(values: &[f64]) -> usize {
	values.iter().enumerate()
		.fold((0, f64::NEG_INFINITY), |(best, max), (i, &v)| {
			if v > max { (i, v) } else { (best, max) }
		})
		.0
}

/// Renders `pixels` as a braille image `width` dots wide. A dot is set
/// when its value is above 0.5.
pub fn render_image(pixels: &[f64], width: usize) -> Result<String, EvalError> {
	let width = width.max(1);
	let height = pixels.len().div_ceil(width);
	let mut img = BrailleImg::new(width as u32, height as u32);
	draw_image(&mut img, pixels, width, 0, 0)?;
	Ok(img.as_str(false, true))
}

fn draw_image(img: &mut BrailleImg, pixels: &[f64], width: usize, x: u32, y: u32) -> Result<(), EvalError> {
	let height = pixels.len().div_ceil(width) as u32;
	pixels.chunks(width).enumerate().try_for_each(|(y1, rows)| {
		rows.iter().enumerate().try_for_each(|(x1, val)| {
			let (px, py) = (x + x1 as u32, y + y1 as u32);
			img.set_dot(px, py, *val > 0.5)
				.map_err(|_| EvalError::Render { x: px, y: py, width: width as u32, height })
		})
	})
}

pub fn format_vector(values: &[f64]) -> String {
	values.iter()
		.map(|v| format!("{:.6}", v))
		.collect::<Vec<_>>()
		.join(" ")
}

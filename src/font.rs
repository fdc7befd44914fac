//! A very small 3x5 bitmap font, enough for angle captions.
//! Covers digits, a handful of letters and basic punctuation.

const GLYPH_W: usize = 3;
const GLYPH_H: usize = 5;

fn glyph(c: char) -> [u8; GLYPH_H] {
    match c.to_ascii_uppercase() {
        '0' => [0x7, 0x5, 0x5, 0x5, 0x7],
        '1' => [0x2, 0x6, 0x2, 0x2, 0x7],
        '2' => [0x7, 0x1, 0x7, 0x4, 0x7],
        '3' => [0x7, 0x1, 0x7, 0x1, 0x7],
        '4' => [0x5, 0x5, 0x7, 0x1, 0x1],
        '5' => [0x7, 0x4, 0x7, 0x1, 0x7],
        '6' => [0x7, 0x4, 0x7, 0x5, 0x7],
        '7' => [0x7, 0x1, 0x2, 0x4, 0x4],
        '8' => [0x7, 0x5, 0x7, 0x5, 0x7],
        '9' => [0x7, 0x5, 0x7, 0x1, 0x7],
        ' ' => [0x0, 0x0, 0x0, 0x0, 0x0],
        ':' => [0x0, 0x2, 0x0, 0x2, 0x0],
        '.' => [0x0, 0x0, 0x0, 0x0, 0x2],
        '-' => [0x0, 0x0, 0x7, 0x0, 0x0],
        '+' => [0x0, 0x2, 0x7, 0x2, 0x0],
        'T' => [0x7, 0x2, 0x2, 0x2, 0x2],
        'N' => [0x6, 0x5, 0x5, 0x5, 0x5],
        'A' => [0x2, 0x5, 0x7, 0x5, 0x5],
        // θ drawn as a barred O
        'θ' | 'Θ' => [0x7, 0x5, 0x7, 0x5, 0x7],
        _ => [0x7, 0x7, 0x7, 0x7, 0x7],
    }
}

/// Advance per character at `scale`: glyph width plus one column of spacing
pub fn measure_text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * (GLYPH_W + 1) * scale
}

pub fn line_height(scale: usize) -> usize {
    (GLYPH_H + 2) * scale
}

/// Draws `text` into an RGB8 buffer of `width x height`, clipping at the edges
pub fn draw_text_line(
    buffer: &mut [u8],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    text: &str,
    color: (u8, u8, u8),
    scale: usize,
) {
    let mut cx = x;
    for c in text.chars() {
        draw_char(buffer, width, height, cx, y, c, color, scale);
        cx += (GLYPH_W + 1) * scale;
    }
}

fn draw_char(buffer: &mut [u8], width: usize, height: usize, x: usize, y: usize, c: char, color: (u8, u8, u8), scale: usize) {
    for (row, bits) in glyph(c).iter().enumerate() {
        for col in 0..GLYPH_W {
            if (bits >> (GLYPH_W - 1 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x + col * scale + dx;
                    let py = y + row * scale + dy;
                    if px < width && py < height {
                        let idx = (py * width + px) * 3;
                        buffer[idx] = color.0;
                        buffer[idx + 1] = color.1;
                        buffer[idx + 2] = color.2;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_counts_characters_not_bytes() {
        assert_eq!(measure_text_width("Θ1", 2), 16);
    }

    #[test]
    fn draws_minus_sign_in_middle_row() {
        let (w, h) = (3, 5);
        let mut buf = vec![0u8; w * h * 3];
        draw_text_line(&mut buf, w, h, 0, 0, "-", (255, 255, 255), 1);
        let lit: Vec<usize> = (0..w * h).filter(|i| buf[i * 3] == 255).collect();
        assert_eq!(lit, vec![6, 7, 8]);
    }

    #[test]
    fn text_is_clipped_at_buffer_edge() {
        let mut buf = vec![0u8; 4 * 4 * 3];
        draw_text_line(&mut buf, 4, 4, 2, 2, "88", (1, 2, 3), 2);
        assert_eq!(buf.len(), 48);
    }
}

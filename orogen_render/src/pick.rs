// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pick-color encoding.
//!
//! Hit-testing renders each eligible node as a flat color encoding its pick
//! id, reads back the pixel under the query point, and decodes the color
//! back into an id. With a fixed RGBA8 target the mapping is a plain 8:8:8
//! split of a 24-bit id across the red, green, and blue channels.
//!
//! The pick buffer is cleared to white before rendering; a readback that
//! still sees white means the point hit empty space. This reserves the
//! all-ones id, which a dense id pool only reaches after 2^24 - 1
//! concurrent live ids.

use crate::pipeline::Color;

/// Ids must fit in the 24 bits of color payload.
pub(crate) const MAX_PICK_ID: u32 = 0x00ff_ffff;

/// The clear color of the pick buffer, decoding to "no hit".
pub(crate) const PICK_BACKGROUND: Color = Color::WHITE;

/// Encodes a pick id as a flat opaque color.
pub(crate) fn encode_pick_color(id: u32) -> Color {
    debug_assert!(id < MAX_PICK_ID, "pick id {id} exceeds the 24-bit range");
    #[expect(
        clippy::cast_possible_truncation,
        reason = "each channel is masked to 8 bits"
    )]
    Color::rgba(
        ((id >> 16) & 0xff) as u8,
        ((id >> 8) & 0xff) as u8,
        (id & 0xff) as u8,
        0xff,
    )
}

/// Decodes a read-back pixel into a pick id, or `None` for the background.
pub(crate) fn decode_pick_pixel(pixel: [u8; 4]) -> Option<u32> {
    let id = (u32::from(pixel[0]) << 16) | (u32::from(pixel[1]) << 8) | u32::from(pixel[2]);
    if id == MAX_PICK_ID {
        return None;
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        for id in [0, 1, 255, 256, 65_535, 65_536, 0x00ab_cdef] {
            let c = encode_pick_color(id);
            assert_eq!(decode_pick_pixel([c.r, c.g, c.b, c.a]), Some(id));
        }
    }

    #[test]
    fn background_decodes_to_no_hit() {
        let c = PICK_BACKGROUND;
        assert_eq!(decode_pick_pixel([c.r, c.g, c.b, c.a]), None);
    }

    #[test]
    fn adjacent_ids_produce_distinct_colors() {
        let a = encode_pick_color(7);
        let b = encode_pick_color(8);
        assert_ne!(a, b);
    }
}

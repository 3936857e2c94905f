//! Pure arithmetic over raw `VkFormat` codes: element and texel-block
//! sizes, mip chains, aspect unpacking. Consumed by the image priming path.

use ash::vk;
use tracing::warn;

/// Element size in bytes plus the texel block dimensions of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementAndTexelBlockSize {
    pub element_size: u32,
    pub texel_block_width: u32,
    pub texel_block_height: u32,
}

/// Size of one mip dimension at `level`, clamped to 1.
pub fn mip_size(base: u32, level: u32) -> u32 {
    (base >> level).max(1)
}

/// Number of `to`-sized units covering `value`, rounded up.
pub fn round_up_to(value: u32, to: u32) -> u32 {
    if to == 0 {
        return value;
    }
    value.div_ceil(to)
}

pub fn next_multiple_of_8(v: u64) -> u64 {
    (v + 7) & !7u64
}

/// Element size and texel block dimensions for `format` (raw VkFormat).
///
/// Compressed formats report the byte size of one whole block. Unknown
/// formats fall back to 4-byte single-texel elements with a warning.
pub fn element_and_texel_block_size(format: i32) -> ElementAndTexelBlockSize {
    let (element_size, bw, bh) = match vk::Format::from_raw(format) {
        vk::Format::R8_UNORM
        | vk::Format::R8_SNORM
        | vk::Format::R8_UINT
        | vk::Format::R8_SINT
        | vk::Format::R8_SRGB
        | vk::Format::S8_UINT => (1, 1, 1),

        vk::Format::R8G8_UNORM
        | vk::Format::R8G8_SNORM
        | vk::Format::R8G8_UINT
        | vk::Format::R8G8_SINT
        | vk::Format::R8G8_SRGB
        | vk::Format::R16_UNORM
        | vk::Format::R16_SNORM
        | vk::Format::R16_UINT
        | vk::Format::R16_SINT
        | vk::Format::R16_SFLOAT
        | vk::Format::R5G6B5_UNORM_PACK16
        | vk::Format::B5G6R5_UNORM_PACK16
        | vk::Format::R4G4B4A4_UNORM_PACK16
        | vk::Format::B4G4R4A4_UNORM_PACK16
        | vk::Format::R5G5B5A1_UNORM_PACK16
        | vk::Format::B5G5R5A1_UNORM_PACK16
        | vk::Format::A1R5G5B5_UNORM_PACK16
        | vk::Format::D16_UNORM => (2, 1, 1),

        vk::Format::R8G8B8_UNORM
        | vk::Format::R8G8B8_SNORM
        | vk::Format::R8G8B8_UINT
        | vk::Format::R8G8B8_SINT
        | vk::Format::R8G8B8_SRGB
        | vk::Format::B8G8R8_UNORM
        | vk::Format::B8G8R8_SRGB => (3, 1, 1),

        vk::Format::R8G8B8A8_UNORM
        | vk::Format::R8G8B8A8_SNORM
        | vk::Format::R8G8B8A8_UINT
        | vk::Format::R8G8B8A8_SINT
        | vk::Format::R8G8B8A8_SRGB
        | vk::Format::B8G8R8A8_UNORM
        | vk::Format::B8G8R8A8_SRGB
        | vk::Format::A8B8G8R8_UNORM_PACK32
        | vk::Format::A8B8G8R8_SRGB_PACK32
        | vk::Format::A2R10G10B10_UNORM_PACK32
        | vk::Format::A2B10G10R10_UNORM_PACK32
        | vk::Format::B10G11R11_UFLOAT_PACK32
        | vk::Format::E5B9G9R9_UFLOAT_PACK32
        | vk::Format::R16G16_UNORM
        | vk::Format::R16G16_SNORM
        | vk::Format::R16G16_UINT
        | vk::Format::R16G16_SINT
        | vk::Format::R16G16_SFLOAT
        | vk::Format::R32_UINT
        | vk::Format::R32_SINT
        | vk::Format::R32_SFLOAT
        | vk::Format::D32_SFLOAT
        | vk::Format::X8_D24_UNORM_PACK32
        | vk::Format::D24_UNORM_S8_UINT => (4, 1, 1),

        vk::Format::D16_UNORM_S8_UINT => (3, 1, 1),
        vk::Format::D32_SFLOAT_S8_UINT => (5, 1, 1),

        vk::Format::R16G16B16A16_UNORM
        | vk::Format::R16G16B16A16_SNORM
        | vk::Format::R16G16B16A16_UINT
        | vk::Format::R16G16B16A16_SINT
        | vk::Format::R16G16B16A16_SFLOAT
        | vk::Format::R32G32_UINT
        | vk::Format::R32G32_SINT
        | vk::Format::R32G32_SFLOAT => (8, 1, 1),

        vk::Format::R32G32B32_UINT
        | vk::Format::R32G32B32_SINT
        | vk::Format::R32G32B32_SFLOAT => (12, 1, 1),

        vk::Format::R32G32B32A32_UINT
        | vk::Format::R32G32B32A32_SINT
        | vk::Format::R32G32B32A32_SFLOAT => (16, 1, 1),

        vk::Format::BC1_RGB_UNORM_BLOCK
        | vk::Format::BC1_RGB_SRGB_BLOCK
        | vk::Format::BC1_RGBA_UNORM_BLOCK
        | vk::Format::BC1_RGBA_SRGB_BLOCK
        | vk::Format::BC4_UNORM_BLOCK
        | vk::Format::BC4_SNORM_BLOCK
        | vk::Format::ETC2_R8G8B8_UNORM_BLOCK
        | vk::Format::ETC2_R8G8B8_SRGB_BLOCK
        | vk::Format::ETC2_R8G8B8A1_UNORM_BLOCK
        | vk::Format::ETC2_R8G8B8A1_SRGB_BLOCK
        | vk::Format::EAC_R11_UNORM_BLOCK
        | vk::Format::EAC_R11_SNORM_BLOCK => (8, 4, 4),

        vk::Format::BC2_UNORM_BLOCK
        | vk::Format::BC2_SRGB_BLOCK
        | vk::Format::BC3_UNORM_BLOCK
        | vk::Format::BC3_SRGB_BLOCK
        | vk::Format::BC5_UNORM_BLOCK
        | vk::Format::BC5_SNORM_BLOCK
        | vk::Format::BC7_UNORM_BLOCK
        | vk::Format::BC7_SRGB_BLOCK
        | vk::Format::ETC2_R8G8B8A8_UNORM_BLOCK
        | vk::Format::ETC2_R8G8B8A8_SRGB_BLOCK
        | vk::Format::EAC_R11G11_UNORM_BLOCK
        | vk::Format::EAC_R11G11_SNORM_BLOCK
        | vk::Format::ASTC_4X4_UNORM_BLOCK
        | vk::Format::ASTC_4X4_SRGB_BLOCK => (16, 4, 4),

        other => {
            warn!("unknown format {:?}, assuming 4-byte elements", other);
            (4, 1, 1)
        }
    };
    ElementAndTexelBlockSize {
        element_size,
        texel_block_width: bw,
        texel_block_height: bh,
    }
}

/// Byte size of one depth element of `format`. Depth data can occupy a
/// different size in a transfer buffer than in the image itself.
pub fn depth_element_size(format: i32, in_buffer: bool) -> u32 {
    match vk::Format::from_raw(format) {
        vk::Format::D16_UNORM | vk::Format::D16_UNORM_S8_UINT => 2,
        vk::Format::X8_D24_UNORM_PACK32 | vk::Format::D24_UNORM_S8_UINT => {
            if in_buffer {
                4
            } else {
                3
            }
        }
        vk::Format::D32_SFLOAT | vk::Format::D32_SFLOAT_S8_UINT => 4,
        other => {
            warn!("format {:?} has no depth aspect", other);
            0
        }
    }
}

/// Split an aspect mask into its individual bits, low to high.
pub fn unpack_aspect_flags(flags: u32) -> Vec<u32> {
    let known = [
        vk::ImageAspectFlags::COLOR.as_raw(),
        vk::ImageAspectFlags::DEPTH.as_raw(),
        vk::ImageAspectFlags::STENCIL.as_raw(),
        vk::ImageAspectFlags::METADATA.as_raw(),
    ];
    known.into_iter().filter(|bit| flags & bit != 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_clamps_to_one() {
        assert_eq!(mip_size(256, 0), 256);
        assert_eq!(mip_size(256, 3), 32);
        assert_eq!(mip_size(256, 9), 1);
        assert_eq!(mip_size(256, 20), 1);
    }

    #[test]
    fn round_up_counts_blocks() {
        assert_eq!(round_up_to(256, 4), 64);
        assert_eq!(round_up_to(255, 4), 64);
        assert_eq!(round_up_to(1, 4), 1);
    }

    #[test]
    fn rgba8_is_four_bytes() {
        let s = element_and_texel_block_size(vk::Format::R8G8B8A8_UNORM.as_raw());
        assert_eq!(s.element_size, 4);
        assert_eq!((s.texel_block_width, s.texel_block_height), (1, 1));
    }

    #[test]
    fn bc1_is_a_block_format() {
        let s = element_and_texel_block_size(vk::Format::BC1_RGB_UNORM_BLOCK.as_raw());
        assert_eq!(s.element_size, 8);
        assert_eq!((s.texel_block_width, s.texel_block_height), (4, 4));
    }

    #[test]
    fn d24_widens_in_buffer() {
        let raw = vk::Format::D24_UNORM_S8_UINT.as_raw();
        assert_eq!(depth_element_size(raw, false), 3);
        assert_eq!(depth_element_size(raw, true), 4);
    }

    #[test]
    fn aspect_unpacking_preserves_order() {
        let mask = vk::ImageAspectFlags::DEPTH.as_raw() | vk::ImageAspectFlags::STENCIL.as_raw();
        assert_eq!(
            unpack_aspect_flags(mask),
            vec![
                vk::ImageAspectFlags::DEPTH.as_raw(),
                vk::ImageAspectFlags::STENCIL.as_raw()
            ]
        );
    }

    #[test]
    fn next_multiple_of_8_rounds() {
        assert_eq!(next_multiple_of_8(0), 0);
        assert_eq!(next_multiple_of_8(1), 8);
        assert_eq!(next_multiple_of_8(8), 8);
        assert_eq!(next_multiple_of_8(9), 16);
    }
}

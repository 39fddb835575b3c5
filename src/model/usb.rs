use super::{Capabilities, Dialect, MarkerMode, ModelDescriptor, Scaling, UsbFamily, MAX_TILT};

#[allow(clippy::too_many_arguments)]
const fn usb(
    product_id: u16,
    key: &'static str,
    name: &'static str,
    packet_len: usize,
    max: (u32, u32),
    max_pressure: i32,
    max_distance: i32,
    family: UsbFamily,
    resolution: u32,
) -> ModelDescriptor {
    let capabilities = family.capabilities();
    // raw pressure is signed on these families
    let pressure_bias = match family {
        UsbFamily::PenPartner => 127,
        UsbFamily::Pl => (max_pressure + 1) / 2,
        _ => 0,
    };
    ModelDescriptor {
        key,
        name,
        dialect: Dialect::Usb(family),
        packet_len,
        max_x: max.0,
        max_y: max.1,
        max_pressure,
        max_distance,
        max_tilt: MAX_TILT,
        resolution,
        tilt_enabled: capabilities.contains(Capabilities::TILT),
        capabilities,
        scaling: Scaling::biased(max_pressure, pressure_bias),
        marker: MarkerMode::Serial,
        product_id: Some(product_id),
    }
}

use UsbFamily::*;

pub const USB_MODELS: [ModelDescriptor; 50] = [
    usb(0x00, "usb-0x00", "Wacom Penpartner", 7, (5040, 3780), 255, 0, PenPartner, 1000),
    usb(0x03, "usb-0x03", "Wacom Cintiq Partner", 8, (20480, 15360), 511, 0, CintiqPartner, 2540),
    usb(0x10, "usb-0x10", "Wacom Graphire", 8, (10206, 7422), 511, 63, Graphire, 2032),
    usb(0x11, "usb-0x11", "Wacom Graphire2 4x5", 8, (10206, 7422), 511, 63, Graphire, 2032),
    usb(0x12, "usb-0x12", "Wacom Graphire2 5x7", 8, (13918, 10206), 511, 63, Graphire, 2032),
    usb(0x13, "usb-0x13", "Wacom Graphire3", 8, (10208, 7424), 511, 63, Graphire, 2032),
    usb(0x14, "usb-0x14", "Wacom Graphire3 6x8", 8, (16704, 12064), 511, 63, Graphire, 2032),
    usb(0x15, "usb-0x15", "Wacom Graphire4 4x5", 8, (10208, 7424), 511, 63, Graphire4, 2032),
    usb(0x16, "usb-0x16", "Wacom Graphire4 6x8", 8, (16704, 12064), 511, 63, Graphire4, 2032),
    usb(0x17, "usb-0x17", "Wacom BambooFun 4x5", 9, (14760, 9225), 511, 63, BambooFun, 2540),
    usb(0x18, "usb-0x18", "Wacom BambooFun 6x8", 9, (21648, 13530), 511, 63, BambooFun, 2540),
    usb(0x20, "usb-0x20", "Wacom Intuos 4x5", 10, (12700, 10600), 1023, 31, Intuos, 2540),
    usb(0x21, "usb-0x21", "Wacom Intuos 6x8", 10, (20320, 16240), 1023, 31, Intuos, 2540),
    usb(0x22, "usb-0x22", "Wacom Intuos 9x12", 10, (30480, 24060), 1023, 31, Intuos, 2540),
    usb(0x23, "usb-0x23", "Wacom Intuos 12x12", 10, (30480, 31680), 1023, 31, Intuos, 2540),
    usb(0x24, "usb-0x24", "Wacom Intuos 12x18", 10, (45720, 31680), 1023, 31, Intuos, 2540),
    usb(0x30, "usb-0x30", "Wacom PL400", 8, (5408, 4056), 255, 0, Pl, 508),
    usb(0x31, "usb-0x31", "Wacom PL500", 8, (6144, 4608), 255, 0, Pl, 508),
    usb(0x32, "usb-0x32", "Wacom PL600", 8, (6126, 4604), 255, 0, Pl, 508),
    usb(0x33, "usb-0x33", "Wacom PL600SX", 8, (6260, 5016), 255, 0, Pl, 508),
    usb(0x34, "usb-0x34", "Wacom PL550", 8, (6144, 4608), 511, 0, Pl, 508),
    usb(0x35, "usb-0x35", "Wacom PL800", 8, (7220, 5780), 511, 0, Pl, 508),
    usb(0x37, "usb-0x37", "Wacom PL700", 8, (6758, 5406), 511, 0, Pl, 508),
    usb(0x38, "usb-0x38", "Wacom PL510", 8, (6282, 4762), 511, 0, Pl, 508),
    usb(0x39, "usb-0x39", "Wacom DTU710", 8, (34080, 27660), 511, 0, Pl, 2540),
    usb(0x3F, "usb-0x3f", "Wacom Cintiq 21UX", 10, (87200, 65600), 1023, 63, Cintiq, 5080),
    usb(0x41, "usb-0x41", "Wacom Intuos2 4x5", 10, (12700, 10600), 1023, 31, Intuos, 2540),
    usb(0x42, "usb-0x42", "Wacom Intuos2 6x8", 10, (20320, 16240), 1023, 31, Intuos, 2540),
    usb(0x43, "usb-0x43", "Wacom Intuos2 9x12", 10, (30480, 24060), 1023, 31, Intuos, 2540),
    usb(0x44, "usb-0x44", "Wacom Intuos2 12x12", 10, (30480, 31680), 1023, 31, Intuos, 2540),
    usb(0x45, "usb-0x45", "Wacom Intuos2 12x18", 10, (45720, 31680), 1023, 31, Intuos, 2540),
    usb(0x47, "usb-0x47", "Wacom Intuos2 6x8 (2)", 10, (20320, 16240), 1023, 31, Intuos, 2540),
    usb(0x60, "usb-0x60", "Wacom Volito", 8, (5104, 3712), 511, 63, Graphire, 2032),
    usb(0x61, "usb-0x61", "Wacom PenStation2", 8, (3250, 2320), 255, 63, Graphire, 2032),
    usb(0x62, "usb-0x62", "Wacom Volito2 4x5", 8, (5104, 3712), 511, 63, Graphire, 2032),
    usb(0x63, "usb-0x63", "Wacom Volito2 2x3", 8, (3248, 2320), 511, 63, Graphire, 2032),
    usb(0x64, "usb-0x64", "Wacom PenPartner2", 8, (3250, 2320), 255, 63, Graphire, 2032),
    usb(0x65, "usb-0x65", "Wacom Bamboo", 9, (14760, 9225), 511, 63, BambooFun, 2540),
    usb(0x69, "usb-0x69", "Wacom Bamboo1", 8, (5104, 3712), 511, 63, Graphire, 2032),
    usb(0xB0, "usb-0xb0", "Wacom Intuos3 4x5", 10, (25400, 20320), 1023, 63, Intuos3S, 5080),
    usb(0xB1, "usb-0xb1", "Wacom Intuos3 6x8", 10, (40640, 30480), 1023, 63, Intuos3, 5080),
    usb(0xB2, "usb-0xb2", "Wacom Intuos3 9x12", 10, (60960, 45720), 1023, 63, Intuos3, 5080),
    usb(0xB3, "usb-0xb3", "Wacom Intuos3 12x12", 10, (60960, 60960), 1023, 63, Intuos3L, 5080),
    usb(0xB4, "usb-0xb4", "Wacom Intuos3 12x19", 10, (97536, 60960), 1023, 63, Intuos3L, 5080),
    usb(0xB5, "usb-0xb5", "Wacom Intuos3 6x11", 10, (54204, 31750), 1023, 63, Intuos3, 5080),
    usb(0xB7, "usb-0xb7", "Wacom Intuos3 4x6", 10, (31496, 19685), 1023, 63, Intuos3S, 5080),
    usb(0xC0, "usb-0xc0", "Wacom DTF720", 8, (6858, 5506), 511, 0, Pl, 508),
    usb(0xC4, "usb-0xc4", "Wacom DTF521", 8, (6282, 4762), 511, 0, Pl, 508),
    usb(0xC5, "usb-0xc5", "Wacom Cintiq 20WSX", 10, (86680, 54180), 1023, 63, CintiqWide, 5080),
    usb(0xC6, "usb-0xc6", "Wacom Cintiq 12WX", 10, (53020, 33440), 1023, 63, CintiqWide, 5080),
];

/// Product id of the DTF720, which has no eraser.
pub const DTF720_PRODUCT_ID: u16 = 0xC0;

/// Stand-in for product ids missing from the table: an Intuos-class tablet.
pub const GENERIC_USB: ModelDescriptor = usb(
    0xFFFF,
    "usb-generic",
    "Generic Wacom USB tablet",
    10,
    (60960, 60960),
    1023,
    63,
    Intuos,
    2540,
);

pub fn find_usb(product_id: u16) -> ModelDescriptor {
    match USB_MODELS.iter().find(|m| m.product_id == Some(product_id)) {
        Some(model) => *model,
        None => {
            log::warn!("Unknown USB product {:#06x}, using generic model", product_id);
            ModelDescriptor {
                product_id: Some(product_id),
                ..GENERIC_USB
            }
        }
    }
}

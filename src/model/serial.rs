use super::{Capabilities, Dialect, MarkerMode, ModelDescriptor, PressureLayout, Scaling, MAX_TILT};

const fn serial(
    key: &'static str,
    name: &'static str,
    dialect: Dialect,
    max: (u32, u32),
    max_pressure: i32,
    resolution: u32,
    capabilities: Capabilities,
) -> ModelDescriptor {
    let tilt_enabled = matches!(dialect, Dialect::Serial5);
    ModelDescriptor {
        key,
        name,
        dialect,
        packet_len: if tilt_enabled { 9 } else { 7 },
        max_x: max.0,
        max_y: max.1,
        max_pressure,
        max_distance: 0,
        max_tilt: MAX_TILT,
        resolution,
        tilt_enabled,
        capabilities,
        scaling: Scaling::for_pressure(max_pressure),
        marker: MarkerMode::Serial,
        product_id: None,
    }
}

const PROTOCOL4_SET: Capabilities = Capabilities::PL_SET.union(Capabilities::MOUSE);

pub const INTUOS: ModelDescriptor = serial(
    "serial-intuos",
    "Wacom Intuos (serial)",
    Dialect::Serial5,
    (30480, 31680),
    1023,
    2540,
    Capabilities::INTUOS_SET,
);

pub const INTUOS2: ModelDescriptor = serial(
    "serial-intuos2",
    "Wacom Intuos2 (serial)",
    Dialect::Serial5,
    (30480, 31680),
    1023,
    2540,
    Capabilities::INTUOS_SET,
);

pub const CINTIQ: ModelDescriptor = serial(
    "serial-cintiq",
    "Wacom Cintiq/PL (serial)",
    Dialect::Serial4 {
        pressure: PressureLayout::Bits8,
        cursor_wheel: false,
    },
    (6144, 4608),
    255,
    508,
    Capabilities::PL_SET,
);

pub const PENPARTNER: ModelDescriptor = serial(
    "serial-penpartner",
    "Wacom PenPartner (serial)",
    Dialect::Serial4 {
        pressure: PressureLayout::Bits8,
        cursor_wheel: false,
    },
    (5040, 3780),
    255,
    1000,
    Capabilities::PENPARTNER_SET,
);

pub const GRAPHIRE: ModelDescriptor = serial(
    "serial-graphire",
    "Wacom Graphire (serial)",
    Dialect::Serial4 {
        pressure: PressureLayout::Bits9,
        cursor_wheel: true,
    },
    (5103, 3711),
    511,
    1016,
    Capabilities::GRAPHIRE_SET,
);

pub const PROTOCOL4: ModelDescriptor = serial(
    "serial-protocol4",
    "Wacom Protocol 4 (serial)",
    Dialect::Serial4 {
        pressure: PressureLayout::Bits8,
        cursor_wheel: false,
    },
    (15240, 15240),
    255,
    1270,
    PROTOCOL4_SET,
);

pub const SERIAL_MODELS: [ModelDescriptor; 6] =
    [INTUOS, INTUOS2, CINTIQ, PENPARTNER, GRAPHIRE, PROTOCOL4];

/// Pick a serial model from the tablet's `~#` model answer,
/// e.g. `~#GD-1218-R00 V1.3-2`.
pub fn detect(answer: &str) -> ModelDescriptor {
    let id = answer.trim();
    let id = id.strip_prefix("~#").unwrap_or(id).as_bytes();
    let version = rom_version(answer);

    let model = match id.get(..2) {
        Some(b"GD") => INTUOS,
        Some(b"XD") => INTUOS2,
        Some(b"PL") | Some(b"DT") => pl_model(id),
        Some(b"CT") => PENPARTNER,
        Some(b"ET") => GRAPHIRE,
        _ if version >= 1.2 => PROTOCOL4,
        _ => protocol4_with_pressure(120),
    };

    log::info!("Detected {} (ROM {:.2}) from '{}'", model.name, version, answer.trim());
    model
}

/// ROM version: the number after the last `V`, up to the next `-`.
fn rom_version(answer: &str) -> f32 {
    answer
        .rfind('V')
        .map(|at| &answer[at + 1..])
        .and_then(|rest| rest.split('-').next())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0.0)
}

/// PL-550, PL-7xx and PL-8xx sense 512 pressure levels, the rest 256.
fn pl_model(id: &[u8]) -> ModelDescriptor {
    let wide = matches!(
        (id.get(3), id.get(4)),
        (Some(b'5'), Some(b'5')) | (Some(b'7'), _) | (Some(b'8'), _)
    );
    if wide {
        CINTIQ.with_max_pressure(511)
    } else {
        CINTIQ
    }
}

fn protocol4_with_pressure(max: i32) -> ModelDescriptor {
    PROTOCOL4.with_max_pressure(max)
}

/// Parse the `~C<max x>,<max y>` coordinate answer.
pub fn parse_coord_answer(answer: &str) -> Option<(u32, u32)> {
    let body = answer.trim().strip_prefix("~C")?;
    let (x, y) = body.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_families() {
        assert_eq!(detect("~#GD-0608-R00 V1.3-2").key, "serial-intuos");
        assert_eq!(detect("~#XD-1212-R00 V1.0-5").key, "serial-intuos2");
        assert_eq!(detect("~#CT-0405-R00 V1.3-1").key, "serial-penpartner");
        assert_eq!(detect("~#ET-0405-A V1.0-2").max_pressure, 511);
    }

    #[test]
    fn test_pl_submodels() {
        assert_eq!(detect("~#PL-550 V1.0-3").max_pressure, 511);
        assert_eq!(detect("~#PL-710 V1.0-3").max_pressure, 511);
        assert_eq!(detect("~#PL-800 V2.0-1").max_pressure, 511);
        let pl500 = detect("~#PL-500 V1.0-3");
        assert_eq!(pl500.max_pressure, 255);
        assert_eq!(
            pl500.dialect,
            Dialect::Serial4 {
                pressure: PressureLayout::Bits8,
                cursor_wheel: false
            }
        );
    }

    #[test]
    fn test_generic_protocol4_by_rom_version() {
        assert_eq!(detect("~#UD-1212-R00 V1.2-5").max_pressure, 255);
        let old = detect("~#UD-1212-R00 V1.1-5");
        assert_eq!(old.max_pressure, 120);
        assert_eq!(old.scaling.touch_threshold, 7);
        assert_eq!(detect("garbage").max_pressure, 120);
    }

    #[test]
    fn test_rom_version() {
        assert_eq!(rom_version("~#GD-0608-R00 V1.3-2"), 1.3);
        assert_eq!(rom_version("~#GD V2.0"), 2.0);
        assert_eq!(rom_version("no version"), 0.0);
    }

    #[test]
    fn test_coord_answer() {
        assert_eq!(parse_coord_answer("~C30480,31680\r"), Some((30480, 31680)));
        assert_eq!(parse_coord_answer("~C1,x"), None);
        assert_eq!(parse_coord_answer("C1,2"), None);
    }
}

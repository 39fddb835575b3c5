use std::cell::RefCell;
use std::rc::Rc;

use wacdec::input::event::{
    ABS_MISC, ABS_PRESSURE, ABS_X, BTN_TOOL_PEN, EV_ABS, EV_KEY, EV_MSC, EV_SYN, INPUT_EVENT_SIZE_64,
    MSC_SERIAL, SYN_REPORT,
};
use wacdec::model::MarkerMode;
use wacdec::{DeviceState, ModelDescriptor, Router, Tablet, ToolCategory, ToolClass, ToolHandle, UsbInput};

fn collect(tablet: &mut Tablet, bytes: &[u8]) -> Vec<(usize, DeviceState)> {
    let mut out = Vec::new();
    let mut sink = |ch: usize, ds: DeviceState| out.push((ch, ds));
    tablet.feed(bytes, &mut sink);
    out
}

fn p5_enter(ch: u8, id: u32, serial: u32) -> [u8; 9] {
    [
        0xC0 | ch,
        ((id >> 5) & 0x7f) as u8,
        (((id & 0x1f) << 2) | ((serial >> 30) & 0x03)) as u8,
        ((serial >> 23) & 0x7f) as u8,
        ((serial >> 16) & 0x7f) as u8,
        ((serial >> 9) & 0x7f) as u8,
        ((serial >> 2) & 0x7f) as u8,
        ((serial & 0x03) << 5) as u8,
        0,
    ]
}

fn p5_pen(ch: u8, x: u32, y: u32, pressure: u32) -> [u8; 9] {
    [
        0xE0 | ch,
        ((x >> 9) & 0x7f) as u8,
        ((x >> 2) & 0x7f) as u8,
        (((x & 0x03) << 5) | ((y >> 11) & 0x1f)) as u8,
        ((y >> 4) & 0x7f) as u8,
        (((y & 0x0f) << 3) | ((pressure >> 7) & 0x07)) as u8,
        (pressure & 0x7f) as u8,
        0x05,
        0x43,
    ]
}

fn p5_exit(ch: u8) -> [u8; 9] {
    [0x80 | ch, 0, 0, 0, 0, 0, 0, 0, 0]
}

#[test]
fn protocol5_two_tools_share_the_tablet() {
    let model = ModelDescriptor::find("serial-intuos2").unwrap();
    let mut tablet = Tablet::new(model, UsbInput::default());

    let mut stream = Vec::new();
    stream.extend(p5_enter(0, 0x822, 0x0102_0304));
    stream.extend(p5_enter(1, 0x82A, 0x0000_0099));
    stream.extend(p5_pen(0, 1000, 2000, 500));
    stream.extend(p5_pen(1, 3000, 4000, 10));
    stream.extend(p5_exit(0));

    let out = collect(&mut tablet, &stream);
    assert_eq!(out.len(), 3);

    let (ch, pen) = out[0];
    assert_eq!(ch, 0);
    assert_eq!(pen.tool, ToolCategory::Pen);
    assert_eq!(pen.serial, 0x0102_0304);
    assert_eq!((pen.x, pen.y, pen.pressure), (1000, 2000, 500));
    assert_eq!((pen.tilt_x, pen.tilt_y), (5, -61));
    assert!(pen.touch);

    let (ch, eraser) = out[1];
    assert_eq!(ch, 1);
    assert_eq!(eraser.tool, ToolCategory::Eraser);
    assert_eq!(eraser.serial, 0x99);
    assert!(!eraser.touch);

    let (ch, gone) = out[2];
    assert_eq!(ch, 0);
    assert!(!gone.proximity);
    assert_eq!(gone.serial, 0x0102_0304);
    assert_eq!(gone.pressure, 0);
}

#[test]
fn protocol5_resyncs_after_line_noise() {
    let model = ModelDescriptor::find("serial-intuos").unwrap();
    let mut tablet = Tablet::new(model, UsbInput::default());

    let mut stream = Vec::new();
    stream.extend(p5_enter(0, 0x822, 1));
    stream.extend([0x12, 0x34, 0x56]);
    stream.extend(p5_pen(0, 10, 20, 100));

    // arrives in awkward pieces
    let mut out = Vec::new();
    for piece in stream.chunks(4) {
        out.extend(collect(&mut tablet, piece));
    }
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].1.x, 10);
    assert!(tablet.stats().resyncs > 0);
}

fn event(ty: u16, code: u16, value: i32) -> Vec<u8> {
    let mut buf = vec![0u8; INPUT_EVENT_SIZE_64];
    buf[16..18].copy_from_slice(&ty.to_le_bytes());
    buf[18..20].copy_from_slice(&code.to_le_bytes());
    buf[20..24].copy_from_slice(&value.to_le_bytes());
    buf
}

#[test]
fn usb_events_switch_to_report_markers() {
    let model = ModelDescriptor::find("usb:0xb2").unwrap();
    let mut tablet = Tablet::new(model, UsbInput::Events);

    let mut stream = Vec::new();
    for x in [100, 200] {
        stream.extend(event(EV_ABS, ABS_X, x));
        stream.extend(event(EV_ABS, ABS_PRESSURE, 400));
        stream.extend(event(EV_ABS, ABS_MISC, 0x822));
        stream.extend(event(EV_KEY, BTN_TOOL_PEN, 1));
        stream.extend(event(EV_MSC, MSC_SERIAL, 0x55));
        stream.extend(event(EV_SYN, SYN_REPORT, 0));
    }

    let out = collect(&mut tablet, &stream);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].1.x, 100);
    assert_eq!(out[1].1.x, 200);
    assert!(out.iter().all(|(_, ds)| ds.serial == 0x55 && ds.touch));
    assert_eq!(tablet.marker(), Some(MarkerMode::Report));
}

#[test]
fn usb_reports_routed_to_logical_tools() {
    let model = ModelDescriptor::find("usb:0xb2").unwrap();
    let mut tablet = Tablet::new(model, UsbInput::Reports);

    let seen: Rc<RefCell<Vec<(ToolClass, DeviceState)>>> = Rc::new(RefCell::new(Vec::new()));
    let mut router = Router::new();
    for handle in ToolHandle::all(0) {
        let seen = Rc::clone(&seen);
        router.attach(
            handle,
            Box::new(move |_: usize, ds: DeviceState| seen.borrow_mut().push((handle.class, ds))),
        );
    }

    let mut stream = Vec::new();
    // enter: grip pen 0x822, serial 0x1234
    stream.extend([2, 0xC0, 0x82, 0x20, 0x00, 0x01, 0x23, 0x40, 0, 0]);
    stream.extend([2, 0xA0, 0x01, 0x00, 0x00, 0x10, 0x40, 0x00, 0x00, 0x08]);
    stream.extend([2, 0x80, 0, 0, 0, 0, 0, 0, 0, 0]);
    // express key 0
    stream.extend([12, 0, 0, 0, 0, 0x01, 0, 0, 0, 0]);

    tablet.feed(&stream, &mut router);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert_eq!(router.unrouted(), 0);

    let (class, pen) = seen[0];
    assert_eq!(class, ToolClass::Stylus);
    assert_eq!((pen.x, pen.y, pen.pressure), (512, 32, 256));
    assert_eq!(pen.serial, 0x1234);
    assert!(pen.touch);

    let (class, out) = seen[1];
    assert_eq!(class, ToolClass::Stylus);
    assert!(!out.proximity);

    let (class, pad) = seen[2];
    assert_eq!(class, ToolClass::Pad);
    assert!(pad.proximity);
    assert!(pad.button(8));
}

#[test]
fn protocol4_session_reset_forgets_tool() {
    let model = ModelDescriptor::find("serial-penpartner").unwrap();
    let mut tablet = Tablet::new(model, UsbInput::default());

    // eraser end: stylus with the side switch held at entry
    let frame = [0xE0, 0x01, 0x00, 0x20, 0x02, 0x00, 0x3F];
    let out = collect(&mut tablet, &frame);
    assert_eq!(out[0].1.tool, ToolCategory::Eraser);

    tablet.reset();
    let plain = [0xE0, 0x01, 0x00, 0x00, 0x02, 0x00, 0x3F];
    let out = collect(&mut tablet, &plain);
    assert_eq!(out[0].1.tool, ToolCategory::Pen);
}

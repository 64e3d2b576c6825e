//! DTV banking through the public API: segments, flash commands and the
//! C64 rows underneath.

use commodore_banking::{OpenBus, WatchEvent, WatchMode};
use emu_c64dtv::registers::{ACCESS_MODE, BANK_SEGMENT, PHYS_SIZE};
use emu_c64dtv::{
    BANK_RAM00, BANK_ROM00, C64DtvConfig, C64DtvMemory, DtvRevision, FLASH_SIZE, FlashState,
    meminit,
};
use emu_core::{Observable, Value};

fn config() -> C64DtvConfig {
    let mut flash = vec![0xFF; FLASH_SIZE];
    flash[0xA000..0xC000].fill(0xBB);
    flash[0xD000..0xE000].fill(0xCC);
    flash[0xE000..0x1_0000].fill(0xEE);
    C64DtvConfig {
        revision: DtvRevision::V3Ntsc,
        flash,
    }
}

fn memory() -> C64DtvMemory<OpenBus> {
    C64DtvMemory::new(&config(), OpenBus::default()).unwrap()
}

/// Unlock sequence followed by `command`, issued through CPU bank 3 in
/// flash mode.
fn flash_command(mem: &mut C64DtvMemory<OpenBus>, command: u8) {
    mem.write(0xCAAA, 0xAA);
    mem.write(0xC554, 0x55);
    mem.write(0xCAAA, command);
}

fn flash_mode(mem: &mut C64DtvMemory<OpenBus>, segment: u8) {
    mem.registers_mut().set(ACCESS_MODE, 0x15);
    mem.registers_mut().set(BANK_SEGMENT + 3, segment);
}

#[test]
fn every_configuration_is_total() {
    let tables = meminit::build().unwrap();
    assert_eq!(tables.configs(), meminit::NUM_CONFIGS);
    assert_eq!(tables.variants(), meminit::NUM_VBANKS);
}

#[test]
fn short_flash_image_is_refused() {
    let mut config = config();
    config.flash.truncate(0x1_0000);
    assert!(C64DtvMemory::new(&config, OpenBus::default()).is_err());
}

#[test]
fn port_switches_rows() {
    let mut mem = memory();
    assert_eq!(mem.read(0xA000), 0xBB);
    mem.write(0x0000, 0x2F);
    mem.write(0x0001, 0x36);
    assert_eq!(mem.config(), 6);
    assert_eq!(mem.read(0xA000), 0x00);
    assert_eq!(mem.read(0xE000), 0xEE);
    assert_eq!(mem.query("config"), Some(Value::U64(6)));
}

#[test]
fn watchpoints_do_not_change_data() {
    let mut mem = memory();
    mem.write(0x1000, 0x5A);
    mem.toggle_watchpoints(WatchMode::On);
    assert_eq!(mem.read(0x1000), 0x5A);
    mem.write(0x1001, 0xA5);
    assert_eq!(mem.peek(0x1001), 0xA5);
    // Flash accesses bypass the C64 rows
    mem.registers_mut().set(ACCESS_MODE, 0x15);
    assert_eq!(mem.read(0xE000), 0xEE);

    let events: Vec<_> = mem.watch_events().drain().collect();
    assert_eq!(events, vec![WatchEvent::Load(0x1000), WatchEvent::Store(0x1001)]);
}

#[test]
fn program_then_erase_sector() {
    let mut mem = memory();
    flash_mode(&mut mem, 0x07);

    flash_command(&mut mem, 0xA0);
    mem.write(0xC010, 0x3C);
    assert_eq!(mem.flash().direct(0x1_C010), 0x3C);
    assert!(mem.flash().is_idle());

    // Sector erase: two unlocks, then $30 to an address in the sector
    flash_command(&mut mem, 0x80);
    mem.write(0xCAAA, 0xAA);
    mem.write(0xC554, 0x55);
    mem.write(0xC000, 0x30);
    assert_eq!(mem.bank_peek(BANK_ROM00 + 1, 0xC010), 0xFF);
    assert_eq!(mem.bank_peek(BANK_ROM00, 0xE000), 0xEE);
}

#[test]
fn product_id_mode_hides_the_array() {
    let mut mem = memory();
    // Bank 0 in flash mode, segment 0
    mem.registers_mut().set(ACCESS_MODE, 0x54);
    mem.write(0x0AAA, 0xAA);
    mem.write(0x0554, 0x55);
    mem.write(0x0AAA, 0x90);
    assert_eq!(mem.flash().state(), FlashState::ProductId);
    assert_eq!(mem.read(0x0000), 0x1F);
    assert_eq!(mem.read(0x0002), 0xC2);
    assert!(mem.translate(0x0100).is_none());
    // The monitor still sees the array
    assert_eq!(mem.peek(0x0000), 0xFF);
    mem.write(0x0000, 0xF0);
    assert!(mem.flash().is_idle());
}

#[test]
fn segments_alias_the_same_ram() {
    let mut mem = memory();
    mem.registers_mut().set(BANK_SEGMENT, 0x44);
    mem.registers_mut().set(BANK_SEGMENT + 1, 0x44);
    mem.write(0x0123, 0x99);
    assert_eq!(mem.read(0x4123), 0x99);
    assert_eq!(mem.bank_peek(BANK_RAM00 + 0x11, 0x0123), 0x99);
}

/// Address-derived fill over the 2 MB of RAM.
fn pattern(addr: usize) -> u8 {
    (addr ^ (addr >> 8) ^ (addr >> 13) ^ 0x5A) as u8
}

fn seeded() -> C64DtvMemory<OpenBus> {
    let mut mem = memory();
    let ram: Vec<u8> = (0..PHYS_SIZE).map(pattern).collect();
    mem.ram_from_snapshot(&ram).unwrap();
    mem
}

fn set_segments(mem: &mut C64DtvMemory<OpenBus>, segments: [u8; 4]) {
    for (bank, segment) in segments.into_iter().enumerate() {
        mem.registers_mut().set(BANK_SEGMENT + bank, segment);
    }
}

/// Checks the direct-read windows of a few addresses per page at the
/// address asked for and at both ends of each limit.
fn assert_windows_agree(mem: &C64DtvMemory<OpenBus>, what: &str) {
    let samples = (0..=0xFF_u16)
        .flat_map(|page| [0x00, 0x01, 0x02, 0x7F, 0xFE, 0xFF].map(|low| (page << 8) | low));
    for addr in samples {
        let Some(t) = mem.translate(addr) else {
            continue;
        };
        for a in [addr, t.limit.start, t.limit.end] {
            if t.limit.contains(a) {
                let direct = mem.source(t.base.source)[t.base.index(a)];
                assert_eq!(direct, mem.peek(a), "{what} ${a:04X}");
            }
        }
    }
}

#[test]
fn direct_reads_agree_with_peek() {
    let mut mem = seeded();
    for lines in 0..8u8 {
        mem.write(0x0000, 0x07);
        mem.write(0x0001, lines);
        for access in [0x55_u8, 0x00, 0x54, 0x15, 0xAA] {
            mem.registers_mut().set(ACCESS_MODE, access);
            for segments in [
                [0, 1, 2, 3],
                [3, 2, 1, 0],
                [0x40, 0x41, 0x42, 0x43],
                [0x07, 0x05, 0x7F, 0x03],
            ] {
                set_segments(&mut mem, segments);
                let what = format!("lines {lines} access {access:02X} segments {segments:02X?}");
                assert_windows_agree(&mem, &what);
            }
            set_segments(&mut mem, [0, 1, 2, 3]);
            mem.registers_mut().set(ACCESS_MODE, 0x55);
        }
    }
}

#[test]
fn all_ram_holds_every_byte() {
    let mut mem = memory();
    mem.write(0x0000, 0x07);
    mem.write(0x0001, 0x00);
    assert_eq!(mem.config(), 0);

    // Identity segments, then the same CPU space over the upper megabyte
    for (segments, phys) in [([0, 1, 2, 3], 0_usize), ([0x40, 0x41, 0x42, 0x43], 0x10_0000)] {
        set_segments(&mut mem, segments);
        for addr in 0x0002..=0xFFFF_u16 {
            mem.write(addr, pattern(phys + usize::from(addr)));
        }
        for addr in 0x0002..=0xFFFF_u16 {
            let expected = pattern(phys + usize::from(addr));
            assert_eq!(mem.read(addr), expected, "${:06X}", phys + usize::from(addr));
        }
    }

    let mut snap = vec![0; PHYS_SIZE];
    mem.ram_to_snapshot(&mut snap).unwrap();
    for phys in [0_usize, 0x10_0000] {
        assert!((phys + 2..phys + 0x1_0000).all(|a| snap[a] == pattern(a)), "${phys:06X}");
    }
}

/// Port changes, segment moves, a read-modify-write sweep over every
/// page with dummy stores in between, and one flash program.
fn busy_script(mem: &mut C64DtvMemory<OpenBus>) {
    for (step, (lines, segment)) in [(0x07_u8, 0x01_u8), (0x06, 0x44), (0x05, 0x02), (0x00, 0x41)]
        .into_iter()
        .enumerate()
    {
        mem.write(0x0000, 0x07);
        mem.write(0x0001, lines);
        mem.registers_mut().set(BANK_SEGMENT + 1, segment);
        let low = 0x02 + step as u16 * 0x11;
        for page in 0..=0xFF_u16 {
            let addr = (page << 8) | low;
            let value = mem.read(addr);
            mem.write(addr, value ^ page as u8);
            mem.dummy_write(addr + 1, step as u8);
        }
    }
    flash_mode(mem, 0x07);
    flash_command(mem, 0xA0);
    mem.write(0xC010, 0x3C);
    mem.registers_mut().reset();
}

fn observed(mem: &C64DtvMemory<OpenBus>) -> Vec<(String, Option<Value>)> {
    let registers = (0..16).map(|reg| format!("regs.r{reg}"));
    mem.query_paths()
        .iter()
        .filter(|path| !path.contains('<'))
        .map(|path| (*path).to_string())
        .chain(registers)
        .map(|path| {
            let value = mem.query(&path);
            (path, value)
        })
        .collect()
}

#[test]
fn watching_leaves_the_machine_untouched() {
    for mode in [WatchMode::On, WatchMode::OnDummy] {
        let mut plain = memory();
        let mut watched = memory();
        watched.toggle_watchpoints(mode);
        busy_script(&mut plain);
        busy_script(&mut watched);

        let mut a = vec![0; PHYS_SIZE];
        let mut b = vec![0; PHYS_SIZE];
        plain.ram_to_snapshot(&mut a).unwrap();
        watched.ram_to_snapshot(&mut b).unwrap();
        assert!(a == b, "{mode:?}: RAM differs");
        plain.flash_to_snapshot(&mut a).unwrap();
        watched.flash_to_snapshot(&mut b).unwrap();
        assert!(a == b, "{mode:?}: flash differs");

        assert_eq!(observed(&plain), observed(&watched), "{mode:?}");
        assert!((0..=0xFFFF_u16).all(|addr| plain.peek(addr) == watched.peek(addr)));
        assert!(plain.watch_events().is_empty());
        assert!(!watched.watch_events().is_empty());
    }
}

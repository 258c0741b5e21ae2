//! The `pci-ascan` driver proper.
//!
//! [`AscanCan`] owns all mutable driver state: the mapped register window,
//! the per-controller units, the channel bookkeeping, and the transmit
//! routing table. One instance drives the whole adapter; the host
//! constructs it, calls [`AscanCan::init`] once, and talks to it through
//! [`CanDevice`] afterwards.

use oxcan_driver_api::can::MAX_DLC;
use oxcan_driver_api::{
    CanDevice, CanError, CanPdu, CanStatistics, ControllerState, IrqMask, KernelServices,
    ModeTransition, PciBar, PciDeviceId, PciDeviceInfo, PduHandle, TxStatus, kdebug, kerr, kinfo,
    kwarn,
};

use crate::config::{CONTROLLER_COUNT, CanConfig, ControllerConfig, HTH_COUNT, ObjectKind};
use crate::hth::HthMap;
use crate::regs::{
    ASCAN_DEVICE_ID, ASCAN_VENDOR_ID, AscanRegs, BUS_NAME, CMD_OPEN, CMD_RESET, CMD_TX,
};
use crate::unit::CanUnit;

/// PCI IDs this driver binds to.
static ID_TABLE: [PciDeviceId; 1] = [PciDeviceId::new(ASCAN_VENDOR_ID, ASCAN_DEVICE_ID)];

/// Global driver lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    /// Not initialized, or initialization found no device.
    Uninit,
    /// Device mapped and controllers brought up.
    Ready,
}

/// Interrupt handler for the adapter.
///
/// Receive delivery and transmit confirmation arrive here; the dispatch
/// into [`CanDevice::confirm_transmission`] and the (stubbed) receive path
/// is wired by the host.
fn ascan_isr(line: u8) {
    kdebug!("ascan: interrupt on line {line}");
}

/// Driver context for the QEMU `pci-ascan` CAN adapter.
pub struct AscanCan {
    state: DriverState,
    config: Option<&'static CanConfig>,
    regs: Option<AscanRegs>,
    /// Bit `n` set when controller `n` appears in the configuration.
    configured: u32,
    /// Controller id → index of its entry in the configuration table.
    channel_map: [Option<u8>; CONTROLLER_COUNT],
    units: [CanUnit; CONTROLLER_COUNT],
    stats: [CanStatistics; CONTROLLER_COUNT],
    hth_map: HthMap,
}

impl AscanCan {
    /// A driver that has not been initialized yet.
    #[must_use]
    pub const fn new() -> Self {
        const UNIT: CanUnit = CanUnit::new();
        const ZERO: CanStatistics = CanStatistics {
            tx_success: 0,
            rx_success: 0,
            tx_errors: 0,
            rx_errors: 0,
            bus_off: 0,
        };
        Self {
            state: DriverState::Uninit,
            config: None,
            regs: None,
            configured: 0,
            channel_map: [None; CONTROLLER_COUNT],
            units: [UNIT; CONTROLLER_COUNT],
            stats: [ZERO; CONTROLLER_COUNT],
            hth_map: HthMap::new(),
        }
    }

    /// Initializes the driver against the devices the host enumerated.
    ///
    /// Locates the adapter in `devices`, maps its register window, hooks
    /// its interrupt line, then brings every configured controller to
    /// [`ControllerState::Stopped`] and opens its channel on the device.
    ///
    /// A missing adapter is not fatal to the host: the driver reports
    /// [`CanError::DeviceNotFound`], stays uninitialized, and rejects all
    /// further calls.
    pub fn init(
        &mut self,
        config: &'static CanConfig,
        devices: &[PciDeviceInfo],
        services: &dyn KernelServices,
    ) -> Result<(), CanError> {
        if self.state != DriverState::Uninit {
            kwarn!("ascan: init called twice");
            return Err(CanError::Transition);
        }
        Self::validate_config(config)?;

        let Some(info) = devices
            .iter()
            .find(|dev| ID_TABLE.iter().any(|id| id.matches(dev)))
        else {
            kerr!("ascan: no CAN adapter found, pass '-device pci-ascan' to qemu");
            return Err(CanError::DeviceNotFound);
        };
        kinfo!(
            "ascan: found {:04x}:{:04x} at {}",
            info.vendor_id,
            info.device_id,
            info.address
        );

        // 1. The register window is resource 1 of the device.
        let PciBar::Memory { base, size } = info.bars[1] else {
            kerr!("ascan: BAR1 is not a memory BAR");
            return Err(CanError::DeviceNotFound);
        };

        // 2. Enable decoding, map the window, hook the interrupt line.
        if let Err(err) = services.enable_pci_resources(info.address) {
            kerr!("ascan: failed to enable PCI resources: {err}");
            return Err(CanError::DeviceNotFound);
        }
        let mmio = match services.map_mmio(base, size) {
            Ok(region) => region,
            Err(err) => {
                kerr!("ascan: failed to map register window: {err}");
                return Err(CanError::DeviceNotFound);
            }
        };
        if let Err(err) = services.register_irq_handler(info.interrupt_line, ascan_isr) {
            kerr!("ascan: failed to hook irq {}: {err}", info.interrupt_line);
            return Err(CanError::DeviceNotFound);
        }

        // SAFETY: `mmio` is a live mapping of the register window, sized by
        // the BAR, and this driver is its only claimant.
        let regs = unsafe { AscanRegs::new(mmio.virt_base()) };
        self.regs = Some(regs);
        self.config = Some(config);
        self.state = DriverState::Ready;

        // 3. Bring up every configured controller.
        for (slot, ctrl) in config.controllers.iter().enumerate() {
            let id = ctrl.controller_id;
            self.channel_map[id as usize] = Some(slot as u8);
            self.configured |= 1 << id;
            self.units[id as usize].reset();
            self.init_controller(id, ctrl)?;
            self.open_channel(id)?;
            self.hth_map.record_controller(id, ctrl)?;
            kinfo!("ascan: CAN{id} channel open on '{BUS_NAME}'");
        }
        kinfo!("ascan: {} controller(s) up", config.controllers.len());
        Ok(())
    }

    /// (Re)initializes one controller.
    ///
    /// Requires the driver [`DriverState::Ready`] and the controller
    /// currently [`ControllerState::Stopped`]; re-running it on a stopped
    /// controller is a safe no-op that clears stale mailbox state.
    pub fn init_controller(
        &mut self,
        controller: u8,
        _config: &ControllerConfig,
    ) -> Result<(), CanError> {
        if self.state != DriverState::Ready {
            kwarn!("ascan: init_controller before init");
            return Err(CanError::Uninit);
        }
        let unit = self.unit_mut(controller)?;
        if unit.state() != ControllerState::Stopped {
            kwarn!("ascan: CAN{controller} re-init while not stopped");
            return Err(CanError::Transition);
        }
        unit.reset();
        unit.enable_interrupts();
        Ok(())
    }

    /// Current operating state of a controller.
    pub fn controller_state(&self, controller: u8) -> Result<ControllerState, CanError> {
        Ok(self.unit(controller)?.state())
    }

    /// Bounds-checks every controller id and transmit object id before any
    /// hardware is touched, so bring-up cannot fail halfway through.
    fn validate_config(config: &CanConfig) -> Result<(), CanError> {
        for ctrl in config.controllers {
            if usize::from(ctrl.controller_id) >= CONTROLLER_COUNT {
                kerr!("ascan: configured controller {} out of range", ctrl.controller_id);
                return Err(CanError::ParamController);
            }
            for hoh in ctrl.object_run() {
                if hoh.kind == ObjectKind::Transmit && usize::from(hoh.object_id) >= HTH_COUNT {
                    kerr!("ascan: configured object {} out of range", hoh.object_id);
                    return Err(CanError::ParamHandle);
                }
            }
        }
        Ok(())
    }

    /// Runs the device's open-channel sequence for one bus: reset, the
    /// backend name byte-by-byte, bus and port index, open command. Masked
    /// so an ISR cannot interleave another register burst.
    fn open_channel(&self, controller: u8) -> Result<(), CanError> {
        let regs = self.regs.as_ref().ok_or(CanError::Uninit)?;
        let _irq = IrqMask::save();
        regs.set_cmd(CMD_RESET);
        for byte in BUS_NAME.bytes() {
            regs.set_bus_name(u32::from(byte));
        }
        regs.set_busid(u32::from(controller));
        regs.set_port(u32::from(controller));
        regs.set_cmd(CMD_OPEN);
        Ok(())
    }

    fn unit(&self, controller: u8) -> Result<&CanUnit, CanError> {
        self.units
            .get(usize::from(controller))
            .ok_or(CanError::ParamController)
    }

    fn unit_mut(&mut self, controller: u8) -> Result<&mut CanUnit, CanError> {
        self.units
            .get_mut(usize::from(controller))
            .ok_or(CanError::ParamController)
    }
}

impl Default for AscanCan {
    fn default() -> Self {
        Self::new()
    }
}

/// Packs up to eight payload bytes into the two little-endian data words,
/// zero-padding short frames.
fn pack_payload(data: &[u8]) -> (u32, u32) {
    let mut bytes = [0u8; MAX_DLC];
    bytes[..data.len()].copy_from_slice(data);
    let low = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let high = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    (low, high)
}

impl CanDevice for AscanCan {
    fn set_controller_mode(
        &mut self,
        controller: u8,
        transition: ModeTransition,
    ) -> Result<(), CanError> {
        let unit = self.unit_mut(controller)?;
        if !unit.is_initialized() {
            kwarn!("ascan: mode change on uninitialized CAN{controller}");
            return Err(CanError::Uninit);
        }
        match unit.request(transition) {
            Ok(()) => {
                if transition == ModeTransition::Start {
                    kinfo!("ascan: CAN{controller} on-line");
                }
                Ok(())
            }
            Err(err) => {
                kwarn!(
                    "ascan: CAN{controller} rejected {transition:?} in state {:?}",
                    unit.state()
                );
                Err(err)
            }
        }
    }

    fn transmit(&mut self, hth: u8, pdu: &CanPdu<'_>) -> Result<TxStatus, CanError> {
        if self.state != DriverState::Ready {
            kwarn!("ascan: transmit before init");
            return Err(CanError::Uninit);
        }
        if pdu.data.len() > MAX_DLC {
            kwarn!("ascan: payload of {} bytes on hth {hth}", pdu.data.len());
            return Err(CanError::ParamDlc);
        }
        let controller = match self.hth_map.resolve(hth) {
            Ok((controller, _hoh)) => controller,
            Err(err) => {
                kwarn!("ascan: transmit on invalid handle {hth}");
                return Err(err);
            }
        };
        let idx = usize::from(controller);
        if self.configured & (1 << controller) == 0 || self.channel_map[idx].is_none() {
            kwarn!("ascan: handle {hth} routes to unconfigured CAN{controller}");
            return Err(CanError::ParamController);
        }
        let unit = &mut self.units[idx];
        if unit.state() != ControllerState::Started {
            kwarn!("ascan: transmit while CAN{controller} is {:?}", unit.state());
            return Err(CanError::Transition);
        }
        let regs = self.regs.as_ref().ok_or(CanError::Uninit)?;

        // Mailbox claim. Interrupts stay masked from the check through the
        // send command so the confirmation ISR cannot race the marker.
        let _irq = IrqMask::save();
        if unit.pending().is_some() {
            return Ok(TxStatus::Busy);
        }
        let (low, high) = pack_payload(pdu.data);
        regs.set_busid(u32::from(controller));
        regs.set_canid(pdu.id);
        regs.set_candlc(pdu.data.len() as u32);
        regs.set_candl(low);
        regs.set_candh(high);
        regs.set_cmd(CMD_TX);
        unit.set_pending(pdu.handle);
        kdebug!(
            "ascan: CAN{controller} tx id={:#x} len={} data={:02x?}",
            pdu.id,
            pdu.data.len(),
            pdu.data
        );
        Ok(TxStatus::Accepted)
    }

    fn disable_controller_interrupts(&mut self, controller: u8) -> Result<(), CanError> {
        let unit = self.unit_mut(controller)?;
        if !unit.is_initialized() {
            return Err(CanError::Uninit);
        }
        unit.disable_interrupts();
        Ok(())
    }

    fn enable_controller_interrupts(&mut self, controller: u8) -> Result<(), CanError> {
        let unit = self.unit_mut(controller)?;
        if !unit.is_initialized() {
            return Err(CanError::Uninit);
        }
        unit.enable_interrupts();
        Ok(())
    }

    fn confirm_transmission(&mut self, controller: u8) -> Option<PduHandle> {
        let idx = usize::from(controller);
        let handle = self.units.get_mut(idx)?.take_pending()?;
        self.stats[idx].tx_success += 1;
        kdebug!("ascan: CAN{controller} tx confirmed, handle {}", handle.0);
        Some(handle)
    }

    fn statistics(&self, controller: u8) -> Result<CanStatistics, CanError> {
        self.stats
            .get(usize::from(controller))
            .copied()
            .ok_or(CanError::ParamController)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareObject;
    use crate::regs::REG_WINDOW_SIZE;
    use oxcan_driver_api::{DriverError, MmioRegion, PciAddress, PhysAddr, VirtAddr};
    use std::sync::atomic::{AtomicU8, Ordering};

    static OBJECTS: [HardwareObject; 3] = [
        HardwareObject {
            object_id: 0,
            kind: ObjectKind::Receive,
            end_of_list: false,
        },
        HardwareObject {
            object_id: 1,
            kind: ObjectKind::Transmit,
            end_of_list: false,
        },
        HardwareObject {
            object_id: 3,
            kind: ObjectKind::Transmit,
            end_of_list: true,
        },
    ];

    static CONTROLLERS: [ControllerConfig; 1] = [ControllerConfig {
        controller_id: 2,
        objects: &OBJECTS,
    }];

    static CONFIG: CanConfig = CanConfig {
        controllers: &CONTROLLERS,
    };

    const TX_HTH: u8 = 1;

    /// Host stand-in: maps "MMIO" onto a plain heap allocation so tests can
    /// read back what the driver wrote to the registers.
    struct FakeKernel {
        virt: u64,
        irq_line: AtomicU8,
    }

    impl KernelServices for FakeKernel {
        fn register_irq_handler(&self, line: u8, _handler: fn(u8)) -> Result<(), DriverError> {
            self.irq_line.store(line, Ordering::SeqCst);
            Ok(())
        }

        fn map_mmio(&self, phys_base: u64, size: u64) -> Result<MmioRegion, DriverError> {
            // SAFETY: `virt` points at a leaked allocation covering `size`
            // bytes; nothing else writes it.
            Ok(unsafe { MmioRegion::new(PhysAddr::new(phys_base), VirtAddr::new(self.virt), size) })
        }

        fn enable_pci_resources(&self, _address: PciAddress) -> Result<(), DriverError> {
            Ok(())
        }
    }

    const BAR1_BASE: u64 = 0xFEB0_0000;

    fn ascan_device() -> PciDeviceInfo {
        let mut bars = [PciBar::Unused; 6];
        bars[1] = PciBar::Memory {
            base: BAR1_BASE,
            size: REG_WINDOW_SIZE,
        };
        PciDeviceInfo {
            address: PciAddress {
                bus: 0,
                device: 4,
                function: 0,
            },
            vendor_id: ASCAN_VENDOR_ID,
            device_id: ASCAN_DEVICE_ID,
            interrupt_line: 11,
            bars,
        }
    }

    struct Harness {
        driver: AscanCan,
        window: u64,
    }

    impl Harness {
        /// Register window contents at word index `idx`.
        fn reg(&self, idx: usize) -> u32 {
            assert!(idx < 8);
            // SAFETY: `window` points at the leaked 8-word allocation the
            // driver treats as its register window.
            unsafe { (self.window as *const u32).add(idx).read_volatile() }
        }
    }

    fn init_harness() -> Harness {
        let window = Box::into_raw(Box::new([0u32; 8])) as u64;
        let services = FakeKernel {
            virt: window,
            irq_line: AtomicU8::new(0),
        };
        let mut driver = AscanCan::new();
        driver.init(&CONFIG, &[ascan_device()], &services).unwrap();
        assert_eq!(services.irq_line.load(Ordering::SeqCst), 11);
        Harness { driver, window }
    }

    fn started_harness() -> Harness {
        let mut harness = init_harness();
        harness
            .driver
            .set_controller_mode(2, ModeTransition::Start)
            .unwrap();
        harness
    }

    #[test]
    fn missing_device_leaves_the_driver_inert() {
        let services = FakeKernel {
            virt: 0,
            irq_line: AtomicU8::new(0),
        };
        let mut driver = AscanCan::new();
        assert_eq!(
            driver.init(&CONFIG, &[], &services),
            Err(CanError::DeviceNotFound)
        );
        let pdu = CanPdu {
            id: 0x1,
            data: &[0u8; 1],
            handle: PduHandle(0),
        };
        assert_eq!(driver.transmit(TX_HTH, &pdu), Err(CanError::Uninit));
        assert_eq!(
            driver.set_controller_mode(2, ModeTransition::Start),
            Err(CanError::Uninit)
        );
    }

    #[test]
    fn init_brings_the_configured_controller_to_stopped() {
        let harness = init_harness();
        assert_eq!(
            harness.driver.controller_state(2),
            Ok(ControllerState::Stopped)
        );
        // Unconfigured controllers stay uninitialized.
        assert_eq!(
            harness.driver.controller_state(0),
            Ok(ControllerState::Uninit)
        );
        assert_eq!(
            harness.driver.controller_state(7),
            Err(CanError::ParamController)
        );
    }

    #[test]
    fn double_init_is_rejected() {
        let mut harness = init_harness();
        let services = FakeKernel {
            virt: harness.window,
            irq_line: AtomicU8::new(0),
        };
        assert_eq!(
            harness.driver.init(&CONFIG, &[ascan_device()], &services),
            Err(CanError::Transition)
        );
    }

    #[test]
    fn open_sequence_reaches_the_device() {
        let harness = init_harness();
        // Last byte of "socket" through the name latch, then bus/port 2 and
        // the open command.
        assert_eq!(harness.reg(0), u32::from(b't'));
        assert_eq!(harness.reg(1), 2);
        assert_eq!(harness.reg(2), 2);
        assert_eq!(harness.reg(7), CMD_OPEN);
    }

    #[test]
    fn transmit_requires_a_started_controller() {
        let mut harness = init_harness();
        let pdu = CanPdu {
            id: 0x42,
            data: &[1, 2],
            handle: PduHandle(9),
        };
        assert_eq!(
            harness.driver.transmit(TX_HTH, &pdu),
            Err(CanError::Transition)
        );
    }

    #[test]
    fn transmit_writes_the_frame_and_claims_the_mailbox() {
        let mut harness = started_harness();
        let pdu = CanPdu {
            id: 0x123,
            data: &[1, 2, 3, 4, 5, 6, 7, 8],
            handle: PduHandle(77),
        };
        assert_eq!(harness.driver.transmit(TX_HTH, &pdu), Ok(TxStatus::Accepted));
        assert_eq!(harness.reg(1), 2);
        assert_eq!(harness.reg(3), 0x123);
        assert_eq!(harness.reg(4), 8);
        assert_eq!(harness.reg(5), 0x0403_0201);
        assert_eq!(harness.reg(6), 0x0807_0605);
        assert_eq!(harness.reg(7), CMD_TX);

        // Mailbox occupied until the confirmation clears it.
        assert_eq!(harness.driver.transmit(TX_HTH, &pdu), Ok(TxStatus::Busy));
        assert_eq!(harness.driver.confirm_transmission(2), Some(PduHandle(77)));
        assert_eq!(harness.driver.transmit(TX_HTH, &pdu), Ok(TxStatus::Accepted));
    }

    #[test]
    fn short_payloads_are_zero_padded() {
        let mut harness = started_harness();
        let pdu = CanPdu {
            id: 0x7FF,
            data: &[0xAA, 0xBB, 0xCC],
            handle: PduHandle(1),
        };
        assert_eq!(harness.driver.transmit(TX_HTH, &pdu), Ok(TxStatus::Accepted));
        assert_eq!(harness.reg(4), 3);
        assert_eq!(harness.reg(5), 0x00CC_BBAA);
        assert_eq!(harness.reg(6), 0);
    }

    #[test]
    fn nine_byte_payload_is_rejected() {
        let mut harness = started_harness();
        let pdu = CanPdu {
            id: 0x1,
            data: &[0u8; 9],
            handle: PduHandle(2),
        };
        assert_eq!(harness.driver.transmit(TX_HTH, &pdu), Err(CanError::ParamDlc));
        // No registers touched, mailbox still free.
        assert_ne!(harness.reg(7), CMD_TX);
        let ok = CanPdu {
            id: 0x1,
            data: &[0u8; 8],
            handle: PduHandle(2),
        };
        assert_eq!(harness.driver.transmit(TX_HTH, &ok), Ok(TxStatus::Accepted));
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let mut harness = started_harness();
        let pdu = CanPdu {
            id: 0x1,
            data: &[0u8; 1],
            handle: PduHandle(3),
        };
        // Receive object, unrecorded slot, and out-of-range handles.
        assert_eq!(harness.driver.transmit(0, &pdu), Err(CanError::ParamHandle));
        assert_eq!(harness.driver.transmit(9, &pdu), Err(CanError::ParamHandle));
        assert_eq!(
            harness.driver.transmit(HTH_COUNT as u8, &pdu),
            Err(CanError::ParamHandle)
        );
    }

    #[test]
    fn sleep_from_started_is_rejected() {
        let mut harness = started_harness();
        assert_eq!(
            harness.driver.set_controller_mode(2, ModeTransition::Sleep),
            Err(CanError::Transition)
        );
        assert_eq!(
            harness.driver.controller_state(2),
            Ok(ControllerState::Started)
        );
        // The legal route: stop, sleep, wake.
        harness
            .driver
            .set_controller_mode(2, ModeTransition::Stop)
            .unwrap();
        harness
            .driver
            .set_controller_mode(2, ModeTransition::Sleep)
            .unwrap();
        harness
            .driver
            .set_controller_mode(2, ModeTransition::Wakeup)
            .unwrap();
        assert_eq!(
            harness.driver.controller_state(2),
            Ok(ControllerState::Stopped)
        );
    }

    #[test]
    fn interrupt_nesting_requires_an_initialized_controller() {
        let mut harness = init_harness();
        assert_eq!(harness.driver.disable_controller_interrupts(2), Ok(()));
        assert_eq!(harness.driver.enable_controller_interrupts(2), Ok(()));
        assert_eq!(
            harness.driver.disable_controller_interrupts(0),
            Err(CanError::Uninit)
        );
        assert_eq!(
            harness.driver.disable_controller_interrupts(200),
            Err(CanError::ParamController)
        );
    }

    #[test]
    fn reinit_of_a_running_controller_is_rejected() {
        let mut harness = started_harness();
        assert_eq!(
            harness.driver.init_controller(2, &CONTROLLERS[0]),
            Err(CanError::Transition)
        );
        harness
            .driver
            .set_controller_mode(2, ModeTransition::Stop)
            .unwrap();
        assert_eq!(harness.driver.init_controller(2, &CONTROLLERS[0]), Ok(()));
    }

    #[test]
    fn confirmation_feeds_the_statistics() {
        let mut harness = started_harness();
        assert_eq!(harness.driver.statistics(2).unwrap().tx_success, 0);
        let pdu = CanPdu {
            id: 0x55,
            data: &[9],
            handle: PduHandle(4),
        };
        harness.driver.transmit(TX_HTH, &pdu).unwrap();
        harness.driver.confirm_transmission(2).unwrap();
        assert_eq!(harness.driver.statistics(2).unwrap().tx_success, 1);
        // Confirmation with nothing pending is a no-op.
        assert_eq!(harness.driver.confirm_transmission(2), None);
        assert_eq!(harness.driver.statistics(2).unwrap().tx_success, 1);
        assert_eq!(
            harness.driver.statistics(200),
            Err(CanError::ParamController)
        );
    }

    #[test]
    fn housekeeping_calls_are_harmless() {
        let mut harness = init_harness();
        harness.driver.check_wakeup(2);
        harness.driver.main_function_write();
        harness.driver.main_function_read();
        harness.driver.main_function_bus_off();
        harness.driver.main_function_wakeup();
        harness.driver.main_function_error();
    }
}

use core::cell::RefCell;

use cortex_m::interrupt;
use cortex_m::peripheral::NVIC;
use cortex_m::register::primask;
use critical_section::{self, Mutex, RawRestoreState};
use defmt_rtt as _;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, SampleTime};
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::pac;
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_time::Instant;

use nightlight_core::{
    EncoderEdgeHandler, ModeController, MotionEdgeHandler, NightLightConfig, SharedState,
};

use crate::hw::{
    self, ENCODER_LINE, EncoderPins, MOTION_LINE, NightLightBoard, PWM_FREQUENCY_HZ, PendingLines,
};
use crate::telemetry;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

const CONFIG: NightLightConfig = NightLightConfig::DEFAULT;

static STORE: SharedState = SharedState::new();
static ENCODER_PINS: Mutex<RefCell<Option<EncoderPins<'static>>>> =
    Mutex::new(RefCell::new(None));

#[cortex_m_rt::entry]
fn main() -> ! {
    let hal::Peripherals {
        PA0,
        PA1,
        PA4,
        PA5,
        PA6,
        PA7,
        PA8,
        PB0,
        PC6,
        TIM3,
        ADC1,
        ..
    } = hal::init(hal::Config::default());

    let Some(core) = cortex_m::Peripherals::take() else {
        defmt::panic!("core peripherals already taken");
    };

    if let Err(err) = CONFIG.validate() {
        defmt::panic!("invalid configuration: {}", defmt::Display2Format(&err));
    }

    // The PIR output only needs its pin in input mode; EXTI does the rest.
    let _pir = Input::new(PA0, Pull::Down);
    let encoder = EncoderPins::new(Input::new(PA1, Pull::Up), Input::new(PA4, Pull::Up));
    critical_section::with(|cs| ENCODER_PINS.borrow_ref_mut(cs).replace(encoder));

    let pwm = SimplePwm::new(
        TIM3,
        Some(PwmPin::new(PA6, OutputType::PushPull)),
        Some(PwmPin::new(PA7, OutputType::PushPull)),
        Some(PwmPin::new(PB0, OutputType::PushPull)),
        None,
        Hertz(PWM_FREQUENCY_HZ),
        CountingMode::EdgeAlignedUp,
    );

    let mut adc = Adc::new(ADC1);
    adc.set_sample_time(SampleTime::CYCLES160_5);

    let board = NightLightBoard::new(
        &STORE,
        pwm,
        adc,
        PA5,
        Output::new(PA8, Level::Low, Speed::Low),
        Output::new(PC6, Level::Low, Speed::Low),
        core.SCB,
    );

    configure_wake_lines();
    defmt::info!(
        "night light up: warm-up {} ms, dark below {}",
        CONFIG.warmup_ms,
        CONFIG.dark_threshold
    );

    let mut controller = ModeController::new(&STORE, board, CONFIG);
    controller.run_with(telemetry::emit)
}

/// Routes PA0 and PA1 onto EXTI lines 0 and 1 with their trigger edges.
/// Both lines stay masked; the controller arms them.
fn configure_wake_lines() {
    let exti = pac::EXTI;
    let both = hw::line_bit(MOTION_LINE) | hw::line_bit(ENCODER_LINE);

    exti.imr(0).modify(|w| {
        w.set_line(MOTION_LINE, false);
        w.set_line(ENCODER_LINE, false);
    });
    // Port A.
    exti.exticr(0).modify(|w| {
        w.set_exti(MOTION_LINE, 0);
        w.set_exti(ENCODER_LINE, 0);
    });
    exti.rtsr(0).modify(|w| {
        w.set_line(MOTION_LINE, true);
        w.set_line(ENCODER_LINE, true);
    });
    exti.ftsr(0).modify(|w| {
        w.set_line(MOTION_LINE, false);
        w.set_line(ENCODER_LINE, true);
    });
    exti.rpr(0).write(|w| w.0 = both);
    exti.fpr(0).write(|w| w.0 = both);

    NVIC::unpend(hal::interrupt::EXTI0_1);
    unsafe {
        NVIC::unmask(hal::interrupt::EXTI0_1);
    }
}

#[pac::interrupt]
fn EXTI0_1() {
    let exti = pac::EXTI;
    let pending = exti.rpr(0).read().0 | exti.fpr(0).read().0;
    let lines = PendingLines::decode(pending, exti.imr(0).read().0);
    if lines.is_empty() {
        return;
    }

    let mask = lines.mask();
    exti.rpr(0).write(|w| w.0 = mask);
    exti.fpr(0).write(|w| w.0 = mask);

    if lines.motion {
        MotionEdgeHandler::new(&STORE).on_rising_edge();
    }

    if lines.encoder {
        let now = hw::millis_from_ticks(Instant::now().as_millis());
        critical_section::with(|cs| {
            if let Some(pins) = ENCODER_PINS.borrow_ref_mut(cs).as_mut() {
                EncoderEdgeHandler::new(&STORE, &CONFIG).on_transition(now, pins);
            }
        });
    }
}

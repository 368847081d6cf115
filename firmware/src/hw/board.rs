//! `Board` implementation over the embassy-stm32 drivers.

use cortex_m::peripheral::{NVIC, SCB};
use embassy_stm32::Peri;
use embassy_stm32::adc::Adc;
use embassy_stm32::gpio::{Input, Output};
use embassy_stm32::pac;
use embassy_stm32::peripherals::{ADC1, PA5, TIM3};
use embassy_stm32::timer::simple_pwm::SimplePwm;
use embassy_time::{Duration, Instant, block_for};

use nightlight_core::platform::{
    Clock, Level, LightSensor, LowPower, RgbOutput, StatusIndicator, Timing, WakeControl,
    WakeSource,
};
use nightlight_core::{EncoderLines, Millis, Rgb, SharedState, SleepCycleController, WakeReason};

use super::{channel_duty, exti_line, line_bit, millis_from_ticks};

/// Encoder phase inputs, read from the `EXTI0_1` handler.
pub struct EncoderPins<'d> {
    clk: Input<'d>,
    dt: Input<'d>,
}

impl<'d> EncoderPins<'d> {
    #[must_use]
    pub fn new(clk: Input<'d>, dt: Input<'d>) -> Self {
        Self { clk, dt }
    }
}

impl EncoderLines for EncoderPins<'_> {
    fn primary(&mut self) -> Level {
        Level::from_high(self.clk.is_high())
    }

    fn secondary(&mut self) -> Level {
        Level::from_high(self.dt.is_high())
    }
}

pub struct NightLightBoard<'d> {
    store: &'d SharedState,
    pwm: SimplePwm<'d, TIM3>,
    adc: Adc<'d, ADC1>,
    sensor: Peri<'d, PA5>,
    sensor_supply: Output<'d>,
    status: Output<'d>,
    scb: SCB,
}

impl<'d> NightLightBoard<'d> {
    #[must_use]
    pub fn new(
        store: &'d SharedState,
        mut pwm: SimplePwm<'d, TIM3>,
        adc: Adc<'d, ADC1>,
        sensor: Peri<'d, PA5>,
        sensor_supply: Output<'d>,
        status: Output<'d>,
        scb: SCB,
    ) -> Self {
        pwm.ch1().enable();
        pwm.ch2().enable();
        pwm.ch3().enable();

        Self {
            store,
            pwm,
            adc,
            sensor,
            sensor_supply,
            status,
            scb,
        }
    }
}

impl Clock for NightLightBoard<'_> {
    fn now(&self) -> Millis {
        millis_from_ticks(Instant::now().as_millis())
    }
}

impl RgbOutput for NightLightBoard<'_> {
    fn write(&mut self, color: Rgb) {
        let (red, full) = channel_duty(color.r);
        self.pwm.ch1().set_duty_cycle_fraction(red, full);
        let (green, full) = channel_duty(color.g);
        self.pwm.ch2().set_duty_cycle_fraction(green, full);
        let (blue, full) = channel_duty(color.b);
        self.pwm.ch3().set_duty_cycle_fraction(blue, full);
    }
}

impl LightSensor for NightLightBoard<'_> {
    fn enable_front_end(&mut self) {
        self.sensor_supply.set_high();
    }

    fn disable_front_end(&mut self) {
        self.sensor_supply.set_low();
    }

    fn read(&mut self) -> u16 {
        self.adc.blocking_read(&mut self.sensor)
    }
}

impl WakeControl for NightLightBoard<'_> {
    fn arm(&mut self, source: WakeSource) {
        let line = exti_line(source);
        pac::EXTI.imr(0).modify(|w| w.set_line(line, true));
    }

    fn disarm(&mut self, source: WakeSource) {
        let line = exti_line(source);
        pac::EXTI.imr(0).modify(|w| w.set_line(line, false));
    }

    fn clear_latched_pending(&mut self, source: WakeSource) {
        let bit = line_bit(exti_line(source));
        pac::EXTI.rpr(0).write(|w| w.0 = bit);
        pac::EXTI.fpr(0).write(|w| w.0 = bit);
        // EXTI0_1 is shared with the other wake line. Unpending it cannot
        // lose that line's edge: EXTI re-raises the request while its own
        // RPR/FPR bit is still set.
        NVIC::unpend(embassy_stm32::interrupt::EXTI0_1);
    }
}

impl LowPower for NightLightBoard<'_> {
    /// Enters STOP with interrupts masked so an edge landing between the
    /// flag check and `wfi` still ends the sleep. The pending handler runs
    /// as soon as PRIMASK is released.
    fn enter_low_power(&mut self) {
        cortex_m::interrupt::disable();

        if SleepCycleController::new(self.store).classify() == WakeReason::Spurious {
            self.scb.set_sleepdeep();
            cortex_m::asm::dsb();
            cortex_m::asm::wfi();
            self.scb.clear_sleepdeep();
        }

        unsafe {
            cortex_m::interrupt::enable();
        }
    }
}

impl Timing for NightLightBoard<'_> {
    fn pause(&mut self, millis: u32) {
        block_for(Duration::from_millis(u64::from(millis)));
    }
}

impl StatusIndicator for NightLightBoard<'_> {
    fn set_status(&mut self, on: bool) {
        if on {
            self.status.set_high();
        } else {
            self.status.set_low();
        }
    }
}

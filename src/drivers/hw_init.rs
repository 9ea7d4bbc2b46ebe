//! One-shot hardware peripheral initialization.
//!
//! Configures ADC channels, GPIO directions and LEDC timers/channels
//! using raw ESP-IDF sys calls. Called once from `main()` before the
//! scheduler loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;
use crate::error::Error;

/// LEDC channel assignments.
pub const LEDC_CH_HEATER: u32 = 0;
pub const LEDC_CH_STIRRER: u32 = 1;
pub const LEDC_CH_FAN: u32 = 2;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), Error> {
    // SAFETY: called once from main() before the scheduler loop;
    // single-threaded at this point.
    unsafe {
        init_adc()?;
        init_gpio_inputs()?;
        init_gpio_outputs()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), Error> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: written only in `init_adc()` before the scheduler loop starts;
/// read only from the single-threaded main-loop ADC path.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), Error> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(Error::Init("ADC1 unit init failed"));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for channel in pins::PROBE_ADC_CHANNELS {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(Error::Init("ADC1 channel config failed"));
        }
    }

    info!("hw_init: ADC1 configured ({} probe channels)", pins::PROBE_ADC_CHANNELS.len());
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: ADC1_HANDLE is written once during init_adc() before this is
    // reachable; single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> u16 {
    0
}

/// Release the ADC unit (emergency shutdown path).
#[cfg(target_os = "espidf")]
pub fn adc_shutdown() {
    // SAFETY: main-loop context; the control cycle has already stopped.
    unsafe {
        let handle = adc1_handle();
        if !handle.is_null() {
            adc_oneshot_del_unit(handle);
            ADC1_HANDLE = core::ptr::null_mut();
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn adc_shutdown() {}

// ── GPIO inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), Error> {
    let input_pins = [
        pins::ENCODER_A_GPIO,
        pins::ENCODER_B_GPIO,
        pins::BUTTON_GPIO,
    ];
    for pin in input_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(Error::Init("input GPIO config failed"));
        }
    }
    Ok(())
}

// ── GPIO outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), Error> {
    let output_pins = [
        pins::DISPLAY_DATA_GPIO,
        pins::DISPLAY_CLOCK_GPIO,
        pins::DISPLAY_LATCH_GPIO,
    ];
    for pin in output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(Error::Init("output GPIO config failed"));
        }
        unsafe { gpio_set_level(pin, 0) };
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: pin configured as input during init_gpio_inputs().
    unsafe { gpio_get_level(pin) != 0 }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    false
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin configured as output during init_gpio_outputs().
    unsafe {
        gpio_set_level(pin, if high { 1 } else { 0 });
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── LEDC PWM ──────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), Error> {
    let timer_cfg = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        freq_hz: 1000,
        clk_cfg: ledc_clk_cfg_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer_cfg) };
    if ret != ESP_OK as i32 {
        return Err(Error::Init("LEDC timer config failed"));
    }

    let channels = [
        (LEDC_CH_HEATER, pins::HEATER_GPIO),
        (LEDC_CH_STIRRER, pins::STIRRER_GPIO),
        (LEDC_CH_FAN, pins::FAN_GPIO),
    ];
    for (channel, gpio) in channels {
        let ch_cfg = ledc_channel_config_t {
            gpio_num: gpio,
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            intr_type: ledc_intr_type_t_LEDC_INTR_DISABLE,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        let ret = unsafe { ledc_channel_config(&ch_cfg) };
        if ret != ESP_OK as i32 {
            return Err(Error::Init("LEDC channel config failed"));
        }
    }
    Ok(())
}

/// Set an 8-bit LEDC duty on `channel` and latch it.
#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty_8bit: u8) {
    // SAFETY: channel configured during init_ledc().
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty_8bit as u32);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty_8bit: u8) {}

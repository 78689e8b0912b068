#![no_std]

/// Digital pins as (port, bit) pairs, plus the direction-switching trait the DHT11 line needs.
pub mod gpio;
/// A calibrated busy-wait [`embedded_hal::delay::DelayNs`] implementation.
pub mod timer;
/// Bit-banged driver for the DHT11 humidity and temperature sensor.
///
/// The sensor answers a host start pulse with a low/high acknowledgement, then 40 bits whose
/// pulse widths encode ones and zeros. There's no peripheral support involved, just polling.
pub mod dht11;
/// Two-stage fan switching driven by temperature thresholds.
pub mod fan;
/// The read, actuate, sleep loop tying the sensor to the fans.
pub mod controller;

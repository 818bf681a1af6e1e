// NetVirt: Topology Virtualization and Traffic Engineering
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Settings of the token bucket filter used for rate limiting.

use log::*;

/// Parameters of the token bucket filter (`tbf`) applied on every shaped interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficControlSettings {
    /// Size of the bucket, in kilobytes
    pub burst_kb: u32,
    /// Maximum time a packet may wait in the queue, in milliseconds
    pub latency_ms: u32,
    /// Maximum depletion rate of the bucket, in Mbit/s
    pub peak_rate_mbit: u32,
    /// Size of the peak-rate bucket, in bytes (usually the MTU)
    pub min_burst: u32,
}

impl Default for TrafficControlSettings {
    fn default() -> Self {
        Self { burst_kb: 5, latency_ms: 70, peak_rate_mbit: 2, min_burst: 1540 }
    }
}

impl TrafficControlSettings {
    /// Arguments of the `tbf` qdisc limiting the interface to `rate` Mbit/s. The rate is rounded
    /// to whole kbit/s, and is at least 1 kbit/s. The peak rate is only set if it lies above the
    /// rate, as `tc` rejects it otherwise.
    pub fn tbf(&self, rate: f64) -> String {
        let kbit = ((rate * 1000.0).round() as u64).max(1);
        let mut args = format!(
            "tbf rate {}kbit burst {}kb latency {}ms",
            kbit, self.burst_kb, self.latency_ms
        );
        if u64::from(self.peak_rate_mbit) * 1000 > kbit {
            args.push_str(&format!(
                " peakrate {}mbit minburst {}",
                self.peak_rate_mbit, self.min_burst
            ));
        } else {
            debug!("peak rate of {}mbit is below {}kbit, omitting it", self.peak_rate_mbit, kbit);
        }
        args
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tbf_with_peak_rate() {
        let settings = TrafficControlSettings::default();
        assert_eq!(
            settings.tbf(1.5),
            "tbf rate 1500kbit burst 5kb latency 70ms peakrate 2mbit minburst 1540"
        );
    }

    #[test]
    fn tbf_without_peak_rate() {
        let settings = TrafficControlSettings::default();
        assert_eq!(settings.tbf(10.0), "tbf rate 10000kbit burst 5kb latency 70ms");
        assert_eq!(settings.tbf(2.0), "tbf rate 2000kbit burst 5kb latency 70ms");

        let settings = TrafficControlSettings { peak_rate_mbit: 100, ..Default::default() };
        assert!(settings.tbf(10.0).ends_with("peakrate 100mbit minburst 1540"));
    }

    #[test]
    fn tbf_minimal_rate() {
        let settings = TrafficControlSettings::default();
        assert!(settings.tbf(0.0).starts_with("tbf rate 1kbit "));
        assert!(settings.tbf(0.0123).starts_with("tbf rate 12kbit "));
    }
}

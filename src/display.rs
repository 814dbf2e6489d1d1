use crate::model::PowerReading;

pub const MINIMUM_POWER_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Off,
    Red,
    Yellow,
    Green,
}

/// What the panel shows for one reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readout {
    pub title: &'static str,
    pub title_color: Color,
    pub text: String,
    pub color: Color,
}

impl Readout {
    /// Below `minimum_power_threshold` the panel goes dark. Above it the colour tells
    /// whether there is enough power for large appliances (1-2 kW each).
    pub fn new(reading: &PowerReading, minimum_power_threshold: i64) -> Self {
        /* Zeros are drawn as `O`, easier to read on the matrix */
        let text = format!("{} W", reading.watts).replace('0', "O");

        if reading.watts < minimum_power_threshold {
            return Readout {
                title: "Growatt",
                title_color: Color::Off,
                text,
                color: Color::Off,
            };
        }

        let color = match reading.watts {
            w if w < 1500 => Color::Red,
            w if w < 2500 => Color::Yellow,
            _ => Color::Green,
        };

        Readout {
            title: "Solar power",
            title_color: Color::Green,
            text,
            color,
        }
    }
}

/// Receives readings from the polling loop. Absent readings are never forwarded.
pub trait DisplaySink {
    /// Shown while a poll is running, so a stuck call is visible.
    fn placeholder(&mut self);

    fn render(&mut self, reading: &PowerReading);
}

#[derive(Debug, Clone)]
pub struct LogDisplay {
    minimum_power_threshold: i64,
}

impl LogDisplay {
    pub fn new(minimum_power_threshold: i64) -> Self {
        LogDisplay {
            minimum_power_threshold,
        }
    }
}

impl DisplaySink for LogDisplay {
    fn placeholder(&mut self) {
        log::debug!(". . .");
    }

    fn render(&mut self, reading: &PowerReading) {
        let readout = Readout::new(reading, self.minimum_power_threshold);
        log::info!(
            "{} [{:?}]: {} [{:?}]",
            readout.title,
            readout.title_color,
            readout.text,
            readout.color
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn readout(watts: i64) -> Readout {
        Readout::new(&PowerReading { watts }, MINIMUM_POWER_THRESHOLD)
    }

    #[test]
    fn below_threshold_is_dark() {
        let r = readout(9);
        assert_eq!(Color::Off, r.color);
        assert_eq!(Color::Off, r.title_color);
        assert_eq!("9 W", r.text);
    }

    #[test]
    fn colour_bands() {
        assert_eq!(Color::Red, readout(10).color);
        assert_eq!(Color::Red, readout(1499).color);
        assert_eq!(Color::Yellow, readout(1500).color);
        assert_eq!(Color::Yellow, readout(2499).color);
        assert_eq!(Color::Green, readout(2500).color);
        assert_eq!("Solar power", readout(2500).title);
    }

    #[test]
    fn zeros_drawn_as_letter_o() {
        assert_eq!("2OO5 W", readout(2005).text);
        assert_eq!("1O W", readout(10).text);
    }
}

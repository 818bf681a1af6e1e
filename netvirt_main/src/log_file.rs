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

//! Log file, written in addition to the console output.

use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Path of the log file of a run started at `start`.
pub fn log_file_path(dir: &Path, start: &DateTime<Local>) -> PathBuf {
    dir.join(format!("netvirt_{}.log", start.format("%Y%m%d%H%M%S")))
}

/// Writer duplicating everything to stderr and to a log file.
#[derive(Debug)]
pub struct Tee {
    file: File,
}

impl Tee {
    /// Create the directory (if necessary) and a new log file inside it.
    pub fn create(dir: &Path, start: &DateTime<Local>) -> io::Result<(Self, PathBuf)> {
        fs::create_dir_all(dir)?;
        let path = log_file_path(dir, start);
        let file = File::create(&path)?;
        Ok((Self { file }, path))
    }
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name() {
        let start = Local.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            log_file_path(Path::new("logs"), &start),
            PathBuf::from("logs/netvirt_20210304050607.log")
        );
    }

    #[test]
    fn tee_writes_file() {
        let dir = std::env::temp_dir().join(format!("netvirt-log-{}", std::process::id()));
        let (mut tee, path) = Tee::create(&dir, &Local::now()).unwrap();
        writeln!(tee, "INFO - hello").unwrap();
        tee.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "INFO - hello\n");
        fs::remove_dir_all(&dir).unwrap();
    }
}

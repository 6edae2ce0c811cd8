//! Utilities for working with CSV files.

use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;

pub struct CsvWriter<W: Write> {
    writer: BufWriter<W>,
}
impl CsvWriter<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let file = File::create(path)?;
        Ok(Self::from_writer(file))
    }
}
impl<W: Write> CsvWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    pub fn append<R>(&mut self, record: R) -> Result<(), io::Error>
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let mut first = true;
        for datum in record.into_iter() {
            if first {
                first = false;
            } else {
                self.writer.write_all(",".as_bytes())?;
            }
            let str: &str = datum.as_ref();
            self.writer.write_all(str.as_bytes())?;
        }
        self.writer.write_all("\n".as_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), io::Error> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> Result<W, io::Error> {
        self.writer.into_inner().map_err(|err| err.into_error())
    }
}

pub struct CsvReader<R: BufRead> {
    lines: Lines<R>,
}
impl<R: BufRead> CsvReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    pub fn read(&mut self) -> Option<Result<Vec<String>, io::Error>> {
        self.lines
            .next()
            .map(|line| line.map(|line| split(&line)))
    }
}

impl<R: BufRead> Iterator for CsvReader<R> {
    type Item = Result<Vec<String>, io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read()
    }
}

fn split(line: &str) -> Vec<String> {
    line.trim_end_matches('\r')
        .split(',')
        .map(|datum| datum.trim().trim_matches('"').to_string())
        .collect()
}

/// A fully-read CSV file with a header row. Blank lines are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
impl CsvTable {
    pub fn read(reader: impl BufRead) -> Result<Self, io::Error> {
        let mut records = CsvReader::from_reader(reader);
        let header = match records.next() {
            None => vec![],
            Some(header) => {
                let mut header = header?;
                if let Some(first) = header.first_mut() {
                    *first = first.trim_start_matches('\u{feff}').to_string();
                }
                header
            }
        };
        let mut rows = vec![];
        for record in records {
            let record = record?;
            if record.iter().all(String::is_empty) {
                continue;
            }
            rows.push(record);
        }
        Ok(Self { header, rows })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column == name)
    }

    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.column(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_table() {
        let data = "\u{feff}HomeTeam,AwayTeam,HC,AC\r\nArsenal,Chelsea,6,3\n\n\"Spurs\", Everton ,4,5\n";
        let table = CsvTable::read(data.as_bytes()).unwrap();
        assert_eq!(vec!["HomeTeam", "AwayTeam", "HC", "AC"], table.header);
        assert_eq!(
            vec![
                vec!["Arsenal", "Chelsea", "6", "3"],
                vec!["Spurs", "Everton", "4", "5"]
            ],
            table.rows
        );
        assert_eq!(Some(2), table.column("HC"));
        assert_eq!(None, table.column("FTHG"));
        assert!(table.has_columns(&["HomeTeam", "AC"]));
        assert!(!table.has_columns(&["HomeTeam", "Date"]));
    }

    #[test]
    fn read_empty() {
        let table = CsvTable::read("".as_bytes()).unwrap();
        assert!(table.header.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn write_records() {
        let mut writer = CsvWriter::from_writer(Vec::new());
        writer.append(["home", "away", "price"]).unwrap();
        writer.append(vec!["A".to_string(), "B".to_string(), "1.85".to_string()]).unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!("home,away,price\nA,B,1.85\n", String::from_utf8(bytes).unwrap());
    }
}

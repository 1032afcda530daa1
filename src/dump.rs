use std::io::{self, Write};

/// Bytes per output line.
pub const GROUP_LEN: usize = 16;
// index within a group after which the extra gap goes
const GAP_AFTER: usize = 7;
const LAST_IN_GROUP: usize = GROUP_LEN - 1;

/// Layout of the generated source.
#[derive(clap::ValueEnum, Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    /// `const` declarations placed in flash, every body line terminated
    #[default]
    Progmem,
    /// Plain declarations, a partial last line is left open before `};`
    Legacy,
}

/// Writes a byte sequence as a C `uint8_t` array, 16 literals per line.
#[derive(Debug, Default, Copy, Clone)]
pub struct ArrayFormatter {
    mode: Mode,
}

impl ArrayFormatter {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Comment, include and declarations, up to and including the opening `{`.
    ///
    /// `name` is written verbatim; a `"` in it breaks the generated declaration.
    pub fn write_header<W: Write>(
        &self,
        out: &mut W,
        name: &str,
        timestamp: &str,
    ) -> io::Result<()> {
        writeln!(out, "// Hex dump of '{}' created at {}", name, timestamp)?;
        writeln!(out)?;
        writeln!(out, "#include <stdint.h>")?;
        writeln!(out)?;

        match self.mode {
            Mode::Progmem => {
                writeln!(out, "const char * image_name=\"{}\";", name)?;
                writeln!(out, "const uint8_t image_data[] PROGMEM = {{")
            }
            Mode::Legacy => {
                writeln!(out, "char * image_name=\"{}\";", name)?;
                writeln!(out, "uint8_t image_data[]= {{")
            }
        }
    }

    /// Emits one `0xhh, ` token per byte and returns how many were written.
    ///
    /// A failed read ends the body and is returned as is.
    pub fn write_body<W, I>(&self, out: &mut W, bytes: I) -> io::Result<usize>
    where
        W: Write,
        I: IntoIterator<Item = io::Result<u8>>,
    {
        let mut n = 0usize;
        for byte in bytes {
            let byte = byte?;

            if n % GROUP_LEN == 0 {
                write!(out, "  ")?;
            }
            write!(out, "0x{:02x}, ", byte)?;
            match n % GROUP_LEN {
                GAP_AFTER => write!(out, "  ")?,
                LAST_IN_GROUP => writeln!(out)?,
                _ => {}
            }

            n += 1;
        }

        Ok(n)
    }

    pub fn write_footer<W: Write>(&self, out: &mut W, emitted: usize) -> io::Result<()> {
        if self.mode == Mode::Progmem && emitted % GROUP_LEN != 0 {
            writeln!(out)?;
        }
        writeln!(out, "}};")
    }

    pub fn write_all<W, I>(
        &self,
        out: &mut W,
        name: &str,
        timestamp: &str,
        bytes: I,
    ) -> io::Result<usize>
    where
        W: Write,
        I: IntoIterator<Item = io::Result<u8>>,
    {
        self.write_header(out, name, timestamp)?;
        let emitted = self.write_body(out, bytes)?;
        self.write_footer(out, emitted)?;
        Ok(emitted)
    }

    pub fn render(&self, name: &str, timestamp: &str, bytes: &[u8]) -> io::Result<String> {
        let mut out = Vec::with_capacity(128 + bytes.len() * 7);
        self.write_all(&mut out, name, timestamp, bytes.iter().copied().map(Ok))?;
        String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

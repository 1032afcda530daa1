use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use bin2array::{dump, util};
use clap::error::ErrorKind;
use clap::Parser;

/// Converts any file to a C style byte array
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// File to dump; put `--` in front of names starting with `-`
    file: PathBuf,

    /// Output layout; `legacy` reproduces the old non-const array
    #[clap(long, value_enum, default_value_t = dump::Mode::Progmem)]
    mode: dump::Mode,

    /// Print progress to stderr
    #[clap(short, long)]
    verbose: bool,
}

fn parse_args<I, T>(args: I) -> Result<Args, util::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Args::try_parse_from(args).map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => util::Error::Usage(err.render().to_string()),
    })
}

fn run<W: Write>(args: &Args, out: &mut W) -> Result<usize, util::Error> {
    if !args.file.is_file() {
        return Err(util::Error::NotFound(args.file.clone()));
    }

    let name = args.file.to_string_lossy();
    let file = File::open(&args.file)?;
    if args.verbose {
        eprintln!("dump {:?}, {} bytes", name, file.metadata()?.len());
    }

    let formatter = dump::ArrayFormatter::new(args.mode);
    let len = formatter.write_all(
        out,
        &name,
        &util::timestamp(),
        BufReader::new(file).bytes(),
    )?;
    out.flush()?;

    if args.verbose {
        eprintln!("{} bytes written as {:?} array", len, formatter.mode());
    }
    Ok(len)
}

fn main() {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let res = parse_args(std::env::args_os()).and_then(|args| run(&args, &mut out));

    if let Err(err) = res {
        match err {
            util::Error::Io(_) => eprintln!("{}", err),
            _ => {
                // usage and lookup failures go to stdout
                writeln!(out, "{}", err).ok();
                out.flush().ok();
            }
        }
        std::process::exit(err.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file() {
        let args = parse_args(["bin2array", "fw.bin"]).unwrap();
        assert_eq!(args.file, PathBuf::from("fw.bin"));
        assert_eq!(args.mode, dump::Mode::Progmem);
        assert!(!args.verbose);
    }

    #[test]
    fn legacy_mode() {
        let args = parse_args(["bin2array", "--mode", "legacy", "-v", "fw.bin"]).unwrap();
        assert_eq!(args.mode, dump::Mode::Legacy);
        assert!(args.verbose);
    }

    #[test]
    fn wrong_arg_count() {
        for argv in [vec!["bin2array"], vec!["bin2array", "a.bin", "b.bin"]] {
            match parse_args(argv) {
                Err(err @ util::Error::Usage(_)) => {
                    assert_eq!(err.exit_code(), 1);
                    assert!(err.to_string().contains("Usage:"), "{}", err);
                }
                other => panic!("expected usage error, got {:?}", other),
            }
        }
    }

    #[test]
    fn unknown_mode() {
        let err = parse_args(["bin2array", "--mode", "hex", "fw.bin"]).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bin2array-{}-{}.bin", tag, rand::random::<u64>()))
    }

    fn from_brace(text: &str) -> &str {
        &text[text.find("{\n").unwrap()..]
    }

    #[test]
    fn missing_file() {
        let path = temp_path("missing");
        let args = parse_args([PathBuf::from("bin2array"), path.clone()]).unwrap();
        let mut out: Vec<u8> = Vec::new();

        match run(&args, &mut out) {
            Err(err @ util::Error::NotFound(_)) => {
                assert_eq!(err.exit_code(), 2);
                assert_eq!(
                    err.to_string(),
                    format!("File '{}' does not exist", path.display())
                );
            }
            other => panic!("expected not found, got {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn directory_is_not_a_file() {
        let args = parse_args([PathBuf::from("bin2array"), std::env::temp_dir()]).unwrap();
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(run(&args, &mut out).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn dumps_file() {
        let data: Vec<u8> = (0..37).map(|_| rand::random()).collect();
        let path = temp_path("dump");
        std::fs::write(&path, &data).unwrap();

        for mode in ["progmem", "legacy"] {
            let argv = [
                PathBuf::from("bin2array"),
                PathBuf::from("--mode"),
                PathBuf::from(mode),
                path.clone(),
            ];
            let args = parse_args(argv).unwrap();
            let mut out: Vec<u8> = Vec::new();

            assert_eq!(run(&args, &mut out).unwrap(), data.len());

            let text = String::from_utf8(out).unwrap();
            let name = path.to_string_lossy();
            let expected = dump::ArrayFormatter::new(args.mode)
                .render(&name, "t", &data)
                .unwrap();
            assert!(text.starts_with(&format!("// Hex dump of '{}' created at ", name)));
            assert_eq!(from_brace(&text), from_brace(&expected), "{}", mode);
        }

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn dash_name_after_separator() {
        assert_eq!(parse_args(["bin2array", "-x.bin"]).unwrap_err().exit_code(), 1);

        let args = parse_args(["bin2array", "--", "-x.bin"]).unwrap();
        assert_eq!(args.file, PathBuf::from("-x.bin"));
    }
}

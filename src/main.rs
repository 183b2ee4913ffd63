use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;

use pdf_docx_convert::{Converter, Invocation, Library, Mode, Office};

const USAGE: &str = "Usage: pdf-docx-convert [pdf2docx|docx2pdf] input_file output_file";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Convert in-process
    Library,
    /// Hand DOCX to PDF to a headless office suite
    Office,
}

#[derive(Parser)]
#[command(
    name = "pdf-docx-convert",
    disable_help_flag = true,
    disable_version_flag = true,
    about = "Convert PDF files to DOCX and DOCX files to PDF",
    override_usage = "pdf-docx-convert [pdf2docx|docx2pdf] input_file output_file"
)]
struct Args {
    /// Conversion direction: pdf2docx or docx2pdf (case-insensitive)
    mode: String,
    /// File to convert
    input: PathBuf,
    /// Where to write the result
    output: PathBuf,
    /// How DOCX to PDF conversion is carried out
    #[arg(long, value_enum, default_value_t = Backend::Library)]
    backend: Backend,
    /// Office suite executable used by the office backend
    #[arg(long, default_value = pdf_docx_convert::office::DEFAULT_OFFICE_BINARY)]
    office_bin: PathBuf,
}

fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            log::debug!("{e}");
            println!("{USAGE}");
            process::exit(1);
        }
    };

    let mode = match args.mode.parse::<Mode>() {
        Ok(mode) => mode,
        Err(e) => {
            println!("ERROR: {e}");
            process::exit(1);
        }
    };

    let converter: Box<dyn Converter> = match args.backend {
        Backend::Library => Box::new(Library),
        Backend::Office => Box::new(Office {
            binary: args.office_bin,
        }),
    };

    let invocation = Invocation {
        mode,
        input: args.input,
        output: args.output,
    };

    match invocation.run(converter.as_ref()) {
        Ok(()) => println!("SUCCESS"),
        Err(e) => {
            println!("ERROR: {e}");
            process::exit(1);
        }
    }
}

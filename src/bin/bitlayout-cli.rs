//! A small command-line demo of the `bitlayout` pipeline: build an
//! interface, decode a raw integer against it, or render a field
//! comparison's shift-and-mask expression.

use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use num_bigint::BigUint;

use bitlayout::prelude::*;

#[derive(Parser)]
#[command(name = "bitlayout-cli", about = "Inspect bit-aligned interfaces from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a raw hex integer against the built-in demo interface and print its JSON form.
    Decode {
        /// The raw interface value, as hex digits (no `0x` prefix).
        #[arg(long)]
        raw: String,
    },
    /// Render the shift-and-mask C expression reading a field of the demo interface.
    RenderExpr {
        /// A dotted/bracketed field path, e.g. `parrot.rgb[1]`.
        path: String,
    },
}

/// The interface every subcommand demonstrates against: a one-bit `holy`
/// flag followed by a `parrot` struct with an enum `status` and an RGB byte
/// triple, laid out exactly as in the crate's own worked examples.
fn demo_tree() -> Rc<Tree> {
    let status = EnumTable::new(vec![("dead", 0u128), ("pining", 1u128), ("resting", 2u128)])
        .expect("built-in enum table is valid");
    let parrot = Type::struct_(vec![
        ("status", Type::uint_enum(2, status).expect("width fits every code")),
        ("rgb", Type::array(Type::uint(5).expect("nonzero width"), 3).expect("nonzero length")),
    ])
    .expect("built-in struct type is valid");
    let quest = Type::struct_(vec![("holy", Type::uint(1).expect("nonzero width")), ("parrot", parrot)])
        .expect("built-in struct type is valid");
    Tree::new(quest)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Decode { raw } => run_decode(&raw),
        Command::RenderExpr { path } => run_render_expr(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run_decode(raw_hex: &str) -> Result<()> {
    let tree = demo_tree();
    let raw = BigUint::parse_bytes(raw_hex.as_bytes(), 16)
        .ok_or_else(|| Error::InvalidEncoding(format!("`{raw_hex}` is not valid hex")))?;
    log::info!("decoding {} bits of raw data", tree.root().width());
    let view = BoundView::new(tree, raw);
    let json = view.json()?;
    println!("{}", serde_json::to_string_pretty(&json).expect("Value -> Json never fails to print"));
    Ok(())
}

fn run_render_expr(path: &str) -> Result<()> {
    let tree = demo_tree();
    let root = SymbolicField::new(tree);
    let field = root
        .get(path)
        .ok_or_else(|| Error::SchemaMismatch(format!("no field at path `{path}`")))?;
    let ir = lower(&field.expr(), None)?;
    println!("{}", render(&ir));
    Ok(())
}

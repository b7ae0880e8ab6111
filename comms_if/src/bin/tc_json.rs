//! Print the JSON form of a telecommand given on the command line.
//!
//! Used to write telecommand scripts, for example:
//!
//! ```text
//! $ tc_json mission calibrate gyro
//! {"Mission":{"Calibrate":"Gyro"}}
//! ```

use comms_if::tc::Tc;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "tc_json", about = "Print the JSON form of a mower telecommand")]
struct Opts {
    /// Prefix the output with this execution time, producing a complete script line.
    #[structopt(short = "t", long = "time")]
    time_s: Option<f64>,

    #[structopt(subcommand)]
    tc: Tc,
}

fn main() {
    let opts = Opts::from_args();

    match opts.tc.to_json() {
        Ok(json) => match opts.time_s {
            Some(t) => println!("{:.2}: {};", t, json),
            None => println!("{}", json),
        },
        Err(e) => {
            eprintln!("Could not serialise the TC: {}", e);
            std::process::exit(1);
        }
    }
}

// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::process::ExitCode;

use clap::Parser as _;
use gherkin_bridge::cli::{self, Opts, Styles};

fn main() -> ExitCode {
    let opts = Opts::parse();
    opts.color.apply();
    cli::init_logging(opts.verbose);

    match futures::executor::block_on(cli::run(opts)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", Styles::default().err("error:"));
            ExitCode::FAILURE
        }
    }
}

// Copyright 2014-2015 Johannes Köster, Peer Aramillo Irizar.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Readers for the two file formats the CLI binaries consume: a bare
//! reference sequence and a simulated-read file with ground-truth
//! positions.

pub mod reads;
pub mod reference;

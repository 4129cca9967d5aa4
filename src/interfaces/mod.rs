//! Inbound/outbound adapters. The CSV pair (operations in, wallet state out)
//! is the batch-driver surface standing in for the out-of-scope HTTP layer.

pub mod csv;

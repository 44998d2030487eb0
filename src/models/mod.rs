// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod api;
pub mod audit;
pub mod crawler;
pub mod queue;
pub mod settings;
pub mod version;
pub mod website;

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod api_test;
mod helpers;
mod pipeline_test;
mod postgres_test;
mod queue_test;
mod repository_test;

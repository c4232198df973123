use std::sync::mpsc;

use bytemuck::cast_slice;
use pollster::block_on;

#[cfg(feature = "tracing")]
use tracing::instrument;

use deslant_core::{binarize_otsu, GrayImageView};
use deslant_engine::{DeslantEngine, DeslantError, InputError, SearchOutcome, ShearCandidates};

use crate::buffers::{BufferDims, DeviceBuffers};
use crate::kernels::{Kernels, ParamsPod, SUM_WORKGROUP_SIZE};
use crate::{fit_mask, OffloadConfig, PaddedMask};

/// Lifecycle of an [`OffloadEngine`].
///
/// Construction either yields a `DeviceReady` engine or fails, so there is
/// no observable uninitialized state. `Failed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    DeviceReady,
    BuffersBound,
    Ready,
    Released,
    Failed,
}

/// Data-parallel deslant engine running on a wgpu device.
///
/// Owns the device, queue, compiled kernels and (once the first image is
/// uploaded) the device buffers. Dimensions are fixed by the
/// [`OffloadConfig`]; every image is fitted to them.
pub struct OffloadEngine {
    config: OffloadConfig,
    candidates: ShearCandidates,
    canvas_width: usize,
    num_groups: usize,
    adapter_info: wgpu::AdapterInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,
    kernels: Kernels,
    buffers: Option<DeviceBuffers>,
    allocations: usize,
    content: (usize, usize),
    state: EngineState,
}

impl OffloadEngine {
    /// Acquire an adapter and device and compile both kernels.
    pub fn new(config: OffloadConfig) -> Result<Self, DeslantError> {
        config.validate()?;
        let candidates = config.candidates()?;
        let canvas_width = config.canvas_width(&candidates);
        let num_groups = canvas_width / config.workgroup_size as usize;

        let instance = wgpu::Instance::default();
        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or_else(|| DeslantError::DeviceUnavailable("no compatible adapter found".into()))?;

        let adapter_info = adapter.get_info();
        if adapter_info.device_type == wgpu::DeviceType::Cpu && !config.allow_software_adapter {
            return Err(DeslantError::DeviceUnavailable(format!(
                "only a software adapter is available ({})",
                adapter_info.name
            )));
        }

        let limits = adapter.limits();
        check_limits(&limits, &config, candidates.len(), num_groups)?;

        let (device, queue) = block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("deslant.device"),
                required_limits: limits,
                ..Default::default()
            },
            None,
        ))
        .map_err(|err| DeslantError::DeviceUnavailable(err.to_string()))?;
        // every device call runs inside an error scope; anything escaping one
        // is logged instead of aborting the process
        device.on_uncaptured_error(Box::new(|err| {
            log::error!("uncaptured device error: {err}");
        }));

        let kernels = Kernels::compile(&device, config.workgroup_size)?;

        log::info!(
            "offload engine on '{}' ({:?}, {:?}): {}x{}, {} candidates, {} workgroups of {}",
            adapter_info.name,
            adapter_info.device_type,
            adapter_info.backend,
            config.width,
            config.height,
            candidates.len(),
            num_groups,
            config.workgroup_size
        );

        Ok(Self {
            config,
            candidates,
            canvas_width,
            num_groups,
            adapter_info,
            device,
            queue,
            kernels,
            buffers: None,
            allocations: 0,
            content: (0, 0),
            state: EngineState::DeviceReady,
        })
    }

    pub fn config(&self) -> &OffloadConfig {
        &self.config
    }

    pub fn candidates(&self) -> &ShearCandidates {
        &self.candidates
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Number of device buffer allocation rounds so far; stays at 1 once the
    /// first image has been uploaded.
    pub fn buffer_allocations(&self) -> usize {
        self.allocations
    }

    /// Upload a fitted mask. Blocks until the upload has completed.
    pub fn set_data(&mut self, data: &PaddedMask) -> Result<(), DeslantError> {
        self.ensure_usable()?;
        if (data.width(), data.height()) != (self.config.width, self.config.height) {
            return Err(InputError::Resolution {
                width: data.width(),
                height: data.height(),
                expected_width: self.config.width,
                expected_height: self.config.height,
            }
            .into());
        }

        if self.buffers.is_none() {
            self.allocate_buffers(BufferDims {
                mask_len: self.config.width * self.config.height,
                num_candidates: self.candidates.len(),
                num_groups: self.num_groups,
            })?;
        }

        let params = ParamsPod {
            content_width: data.content_width as u32,
            content_height: data.content_height as u32,
            stride: self.config.width as u32,
            num_candidates: self.candidates.len() as u32,
            num_groups: self.num_groups as u32,
            canvas_width: self.canvas_width as u32,
            _pad: [0; 2],
        };
        let words: Vec<u32> = data.mask.data.iter().map(|&v| u32::from(v)).collect();

        let result = self.scoped(|engine| {
            let Some(buffers) = engine.buffers.as_ref() else {
                return Err(DeslantError::RuntimeFailure(
                    "device buffers missing".into(),
                ));
            };
            engine.queue.write_buffer(&buffers.mask, 0, cast_slice(&words));
            engine
                .queue
                .write_buffer(&buffers.params, 0, bytemuck::bytes_of(&params));
            let index = engine.queue.submit(std::iter::empty());
            engine
                .device
                .poll(wgpu::Maintain::WaitForSubmissionIndex(index));
            Ok(())
        });
        self.settle(result)?;

        self.content = (data.content_width, data.content_height);
        self.state = EngineState::Ready;
        Ok(())
    }

    /// Score every candidate against the uploaded mask.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self), fields(candidates = self.candidates.len()))
    )]
    pub fn compute(&mut self) -> Result<SearchOutcome, DeslantError> {
        self.ensure_usable()?;
        if self.state != EngineState::Ready {
            return Err(
                InputError::Config("compute called before any data was uploaded".into()).into(),
            );
        }

        let result = self.scoped(|engine| engine.dispatch_and_read());
        let totals = self.settle(result)?;

        for (alpha, score) in self.candidates.iter().zip(&totals) {
            log::debug!("alpha={alpha:.4} score={score}");
        }
        let scores: Vec<u64> = totals.into_iter().map(u64::from).collect();
        Ok(SearchOutcome::from_scores(self.candidates.alphas(), &scores))
    }

    /// Release all device buffers. The engine is unusable afterwards; calling
    /// this again, or dropping the engine, releases nothing twice.
    pub fn release(&mut self) {
        self.teardown();
    }

    /// Allocate and bind the device buffers. Buffers that failed to allocate
    /// are never stored, so teardown only sees complete allocations.
    fn allocate_buffers(&mut self, dims: BufferDims) -> Result<(), DeslantError> {
        let result = self.scoped(|engine| {
            Ok(DeviceBuffers::allocate(
                &engine.device,
                &engine.kernels,
                dims,
                engine.candidates.alphas(),
            ))
        });
        let buffers = self.settle(result)?;
        self.buffers = Some(buffers);
        self.allocations += 1;
        self.state = EngineState::BuffersBound;
        Ok(())
    }

    fn dispatch_and_read(&self) -> Result<Vec<u32>, DeslantError> {
        let Some(buffers) = self.buffers.as_ref() else {
            return Err(DeslantError::RuntimeFailure("device buffers missing".into()));
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("deslant.encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("deslant.process_columns"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.kernels.process_columns);
            pass.set_bind_group(0, &buffers.process_bind_group, &[]);
            pass.dispatch_workgroups(self.num_groups as u32, self.candidates.len() as u32, 1);
        }
        {
            // separate pass: all partial sums are written before they are summed
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("deslant.sum_columns"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.kernels.sum_columns);
            pass.set_bind_group(0, &buffers.sum_bind_group, &[]);
            let groups = (self.candidates.len() as u32).div_ceil(SUM_WORKGROUP_SIZE);
            pass.dispatch_workgroups(groups, 1, 1);
        }
        let bytes = buffers.totals_bytes();
        encoder.copy_buffer_to_buffer(&buffers.totals, 0, &buffers.staging, 0, bytes);
        self.queue.submit(Some(encoder.finish()));

        let slice = buffers.staging.slice(0..bytes);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = sender.send(res);
        });
        self.device.poll(wgpu::Maintain::Wait);
        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                return Err(DeslantError::RuntimeFailure(format!(
                    "failed to map result buffer: {err}"
                )))
            }
            Err(_) => {
                return Err(DeslantError::RuntimeFailure(
                    "result buffer mapping was never completed".into(),
                ))
            }
        }
        let totals = {
            let view = slice.get_mapped_range();
            cast_slice::<u8, u32>(&view).to_vec()
        };
        buffers.staging.unmap();
        Ok(totals)
    }

    /// Run `f` inside validation and out-of-memory error scopes.
    fn scoped<T>(
        &self,
        f: impl FnOnce(&Self) -> Result<T, DeslantError>,
    ) -> Result<T, DeslantError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = f(self);
        let validation = block_on(self.device.pop_error_scope());
        let oom = block_on(self.device.pop_error_scope());
        let value = result?;
        if let Some(err) = validation.or(oom) {
            return Err(DeslantError::RuntimeFailure(err.to_string()));
        }
        Ok(value)
    }

    /// Record a runtime failure as terminal.
    fn settle<T>(&mut self, result: Result<T, DeslantError>) -> Result<T, DeslantError> {
        if let Err(DeslantError::RuntimeFailure(msg)) = &result {
            log::error!("offload engine failed: {msg}");
            self.state = EngineState::Failed;
        }
        result
    }

    fn ensure_usable(&self) -> Result<(), DeslantError> {
        match self.state {
            EngineState::Failed => Err(DeslantError::RuntimeFailure(
                "engine is unusable after an earlier accelerator failure".into(),
            )),
            EngineState::Released => {
                Err(DeslantError::RuntimeFailure("engine has been released".into()))
            }
            _ => Ok(()),
        }
    }

    fn teardown(&mut self) {
        if self.state == EngineState::Released {
            return;
        }
        // DeviceBuffers destroys its buffers on drop; an engine that never
        // saw an image has none to release
        if self.buffers.take().is_some() {
            log::debug!("offload engine released");
        }
        self.state = EngineState::Released;
    }
}

impl Drop for OffloadEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl DeslantEngine for OffloadEngine {
    fn name(&self) -> &'static str {
        "offload"
    }

    fn search(&mut self, img: &GrayImageView<'_>) -> Result<SearchOutcome, DeslantError> {
        img.validate()?;
        let mask = binarize_otsu(img);
        let fitted = fit_mask(&mask, self.config.width, self.config.height);
        self.set_data(&fitted)?;
        self.compute()
    }
}

impl std::fmt::Debug for OffloadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffloadEngine")
            .field("adapter", &self.adapter_info.name)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("content", &self.content)
            .field("allocations", &self.allocations)
            .finish()
    }
}

fn check_limits(
    limits: &wgpu::Limits,
    config: &OffloadConfig,
    num_candidates: usize,
    num_groups: usize,
) -> Result<(), DeslantError> {
    let wg = config.workgroup_size;
    if wg > limits.max_compute_invocations_per_workgroup || wg > limits.max_compute_workgroup_size_x
    {
        return Err(DeslantError::DeviceUnavailable(format!(
            "device does not support workgroups of {wg} invocations"
        )));
    }
    let max_groups = limits.max_compute_workgroups_per_dimension as usize;
    if num_groups > max_groups || num_candidates > max_groups {
        return Err(DeslantError::DeviceUnavailable(format!(
            "dispatch of {num_groups}x{num_candidates} workgroups exceeds the device limit {max_groups}"
        )));
    }
    let max_binding = limits.max_storage_buffer_binding_size as u64;
    let mask_bytes = (config.width * config.height * 4) as u64;
    let partial_bytes = (num_candidates * num_groups * 4) as u64;
    if mask_bytes > max_binding || partial_bytes > max_binding {
        return Err(DeslantError::DeviceUnavailable(format!(
            "buffers of {} bytes exceed the device binding limit {max_binding}",
            mask_bytes.max(partial_bytes)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deslant_core::BinaryMask;

    fn software_engine() -> OffloadEngine {
        OffloadEngine::new(OffloadConfig {
            allow_software_adapter: true,
            ..OffloadConfig::with_resolution(64, 32)
        })
        .expect("offload engine")
    }

    #[test]
    fn limits_too_small_for_the_workgroup_are_unavailable() {
        let limits = wgpu::Limits {
            max_compute_invocations_per_workgroup: 32,
            ..wgpu::Limits::default()
        };
        let config = OffloadConfig::default();
        let err = check_limits(&limits, &config, 9, 18).unwrap_err();
        assert!(matches!(err, DeslantError::DeviceUnavailable(_)));
    }

    #[test]
    fn oversized_dispatch_and_buffers_are_unavailable() {
        let config = OffloadConfig::default();
        let limits = wgpu::Limits {
            max_compute_workgroups_per_dimension: 8,
            ..wgpu::Limits::default()
        };
        assert!(matches!(
            check_limits(&limits, &config, 9, 18),
            Err(DeslantError::DeviceUnavailable(_))
        ));

        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: 1024,
            ..wgpu::Limits::default()
        };
        assert!(matches!(
            check_limits(&limits, &config, 9, 18),
            Err(DeslantError::DeviceUnavailable(_))
        ));

        check_limits(&wgpu::Limits::default(), &config, 9, 18).unwrap();
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn device_errors_leave_the_engine_failed() {
        let mut engine = software_engine();
        // a bind group missing every entry fails validation
        let result = engine.scoped(|e| {
            e.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: None,
                layout: &e.kernels.process_layout,
                entries: &[],
            });
            Ok(())
        });
        let err = engine.settle(result).unwrap_err();
        assert!(matches!(err, DeslantError::RuntimeFailure(_)));
        assert_eq!(engine.state(), EngineState::Failed);

        let mask = fit_mask(&BinaryMask::new(64, 32), 64, 32);
        assert!(matches!(
            engine.set_data(&mask),
            Err(DeslantError::RuntimeFailure(_))
        ));
        assert!(matches!(
            engine.compute(),
            Err(DeslantError::RuntimeFailure(_))
        ));
        assert_eq!(engine.buffer_allocations(), 0);
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn released_engine_rejects_further_work() {
        let mut engine = software_engine();
        let mask = fit_mask(&BinaryMask::new(64, 32), 64, 32);
        engine.set_data(&mask).unwrap();
        assert_eq!(engine.buffer_allocations(), 1);

        engine.release();
        assert_eq!(engine.state(), EngineState::Released);
        assert!(engine.buffers.is_none());
        assert!(matches!(
            engine.set_data(&mask),
            Err(DeslantError::RuntimeFailure(_))
        ));
        assert!(matches!(
            engine.compute(),
            Err(DeslantError::RuntimeFailure(_))
        ));

        // a second release and the drop are no-ops
        engine.release();
        assert_eq!(engine.state(), EngineState::Released);
    }
}

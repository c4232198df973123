use bytemuck::{Pod, Zeroable};
use pollster::block_on;

use deslant_engine::DeslantError;

const PROCESS_COLUMNS_WGSL: &str = include_str!("shaders/process_columns.wgsl");
const SUM_COLUMNS_WGSL: &str = include_str!("shaders/sum_columns.wgsl");

pub(crate) const SUM_WORKGROUP_SIZE: u32 = 64;

/// Uniform block shared by both kernels. Layout must match `Params` in the WGSL.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub(crate) struct ParamsPod {
    pub content_width: u32,
    pub content_height: u32,
    pub stride: u32,
    pub num_candidates: u32,
    pub num_groups: u32,
    pub canvas_width: u32,
    pub _pad: [u32; 2],
}

/// The two compiled compute programs and their bind group layouts.
pub(crate) struct Kernels {
    pub process_columns: wgpu::ComputePipeline,
    pub sum_columns: wgpu::ComputePipeline,
    pub process_layout: wgpu::BindGroupLayout,
    pub sum_layout: wgpu::BindGroupLayout,
}

impl Kernels {
    pub fn compile(device: &wgpu::Device, workgroup_size: u32) -> Result<Self, DeslantError> {
        let process_source = process_columns_source(workgroup_size);
        let (process_columns, process_layout) = build_pipeline(
            device,
            "process_columns",
            &process_source,
            &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, false),
                uniform_entry(3),
            ],
        )?;
        let (sum_columns, sum_layout) = build_pipeline(
            device,
            "sum_columns",
            SUM_COLUMNS_WGSL,
            &[storage_entry(0, true), storage_entry(1, false), uniform_entry(2)],
        )?;

        Ok(Self {
            process_columns,
            sum_columns,
            process_layout,
            sum_layout,
        })
    }
}

pub(crate) fn process_columns_source(workgroup_size: u32) -> String {
    PROCESS_COLUMNS_WGSL.replace("{{WG_SIZE}}", &workgroup_size.to_string())
}

/// Build one compute pipeline and its bind group layout inside validation and
/// out-of-memory error scopes, so that a bad program surfaces as
/// `CompileFailure` carrying the compiler log.
fn build_pipeline(
    device: &wgpu::Device,
    entry_point: &str,
    source: &str,
    entries: &[wgpu::BindGroupLayoutEntry],
) -> Result<(wgpu::ComputePipeline, wgpu::BindGroupLayout), DeslantError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(entry_point),
        entries,
    });
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(entry_point),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(entry_point),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(entry_point),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point,
        compilation_options: Default::default(),
        cache: None,
    });

    let validation = block_on(device.pop_error_scope());
    let oom = block_on(device.pop_error_scope());
    if let Some(err) = validation.or(oom) {
        return Err(DeslantError::CompileFailure {
            kernel: entry_point.to_string(),
            log: err.to_string(),
        });
    }
    log::debug!("compiled kernel '{entry_point}'");
    Ok((pipeline, layout))
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_block_is_32_bytes() {
        assert_eq!(std::mem::size_of::<ParamsPod>(), 32);
    }

    #[test]
    fn workgroup_size_is_substituted() {
        let src = process_columns_source(128);
        assert!(!src.contains("{{WG_SIZE}}"));
        assert!(src.contains("@workgroup_size(128)"));
        assert!(src.contains("array<u32, 128>"));
        assert!(src.contains("fn process_columns("));
        assert!(SUM_COLUMNS_WGSL.contains(&format!("@workgroup_size({SUM_WORKGROUP_SIZE})")));
    }

    fn test_device() -> wgpu::Device {
        let instance = wgpu::Instance::default();
        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .expect("adapter");
        let (device, _queue) =
            block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None))
                .expect("device");
        device
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn broken_program_reports_the_compiler_log() {
        let device = test_device();
        let broken = process_columns_source(64).replace("fn process_columns(", "fn {(");
        let err = build_pipeline(&device, "process_columns", &broken, &[storage_entry(0, true)])
            .unwrap_err();
        match err {
            DeslantError::CompileFailure { kernel, log } => {
                assert_eq!(kernel, "process_columns");
                assert!(!log.trim().is_empty());
            }
            other => panic!("expected a compile failure, got {other:?}"),
        }
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn both_kernels_compile() {
        let device = test_device();
        Kernels::compile(&device, 64).unwrap();
    }
}

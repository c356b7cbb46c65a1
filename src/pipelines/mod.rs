pub mod forward;
pub mod uniforms;

/// What differs between the engine's pipelines. Everything else is fixed: triangle
/// lists, counter-clockwise front faces, no multisampling.
pub struct PipelineTargets<'a> {
    pub label: &'a str,
    pub colour_format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
    /// Depth testing is skipped when `None`.
    pub depth_format: Option<wgpu::TextureFormat>,
    pub cull_mode: Option<wgpu::Face>,
}

/// Compiles `source` and builds a pipeline using its `vs_main` and `fs_main` entry
/// points.
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    targets: PipelineTargets<'_>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    source: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(source);
    let colour_targets = [Some(wgpu::ColorTargetState {
        format: targets.colour_format,
        blend: targets.blend,
        write_mask: wgpu::ColorWrites::ALL,
    })];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(targets.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &colour_targets,
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: targets.cull_mode,
            ..Default::default()
        },
        depth_stencil: targets.depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: Some(true),
            depth_compare: Some(wgpu::CompareFunction::Less),
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview_mask: None,
        cache: None,
    })
}
